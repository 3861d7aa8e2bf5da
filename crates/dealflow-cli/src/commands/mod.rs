pub mod batch;
pub mod dispatch;
pub mod events;
pub mod feed;
pub mod filter;
pub mod fund;
pub mod inject;
pub mod investor;
pub mod project;
pub mod replay;
