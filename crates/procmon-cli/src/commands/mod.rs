pub mod decode;
pub mod run;
pub mod status;
