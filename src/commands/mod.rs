pub mod flow;
pub mod inspect;
pub mod login;
pub mod ready;
pub mod run;
pub mod smoke;
pub mod utils;
