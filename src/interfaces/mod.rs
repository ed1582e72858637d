//! Batch interface: commands in, outcomes out, one JSON document per line.

pub mod jsonl;
