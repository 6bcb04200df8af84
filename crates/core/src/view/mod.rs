//! Pure projections of a [`RateSnapshot`](crate::domain::RateSnapshot) into what the dashboard
//! renders. Nothing here touches the store or mutates the snapshot.

pub mod chart;
pub mod table;
