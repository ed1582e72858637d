//! Application layer containing the membership orchestration.
//!
//! This module defines the `MembershipService`, the single point of
//! coordination between participant records, events, the payment catalog and
//! membership links. Every operation runs inside one unit of work.

pub mod membership;
