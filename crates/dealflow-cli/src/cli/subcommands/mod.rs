mod fund;
mod investor;
mod project;

pub use fund::FundCommands;
pub use investor::InvestorCommands;
pub use project::ProjectCommands;
