pub mod run;
pub mod sections;
pub mod toc;
pub mod validate;
