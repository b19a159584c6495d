pub mod cli {
    pub mod parser;
}
pub mod config;
pub mod error;
pub mod gitlab {
    pub mod branches;
    pub mod client;
    pub mod issues;
}
pub mod logging;
pub mod output;
pub mod rocket {
    pub mod client;
    pub mod message;
}
pub mod run;
pub mod sweep;
