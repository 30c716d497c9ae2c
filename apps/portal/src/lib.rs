pub mod router;
pub mod shell;
