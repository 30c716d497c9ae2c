pub mod account;
pub mod password_reset;

pub use account::AuthService;
pub use password_reset::PasswordResetService;
