pub mod account;
pub mod avatar;
pub mod mailer;
pub mod password;
pub mod password_reset;

pub use account::AccountService;
pub use avatar::ProfilePictureService;
pub use mailer::MailService;
pub use password::PasswordService;
pub use password_reset::PasswordResetService;
