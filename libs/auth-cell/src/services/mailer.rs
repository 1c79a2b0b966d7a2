use lettre::{
    message::{header::ContentType, Mailbox, Message},
    transport::smtp::{authentication::Credentials, PoolConfig},
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};

use shared_config::AppConfig;

use crate::models::AuthError;

#[derive(Clone)]
pub struct MailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_mailbox: Mailbox,
}

impl MailService {
    pub fn new(config: &AppConfig) -> Result<Self, AuthError> {
        if !config.is_mail_configured() {
            return Err(AuthError::MailError("SMTP is not configured".to_string()));
        }

        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.clone(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| AuthError::MailError(format!("Failed to connect to SMTP server: {}", e)))?
            .credentials(credentials)
            .pool_config(PoolConfig::default())
            .build();

        let from_mailbox = config.smtp_from
            .parse()
            .map_err(|e| AuthError::MailError(format!("Invalid from address: {}", e)))?;

        Ok(Self {
            mailer,
            from_mailbox,
        })
    }

    pub async fn send_password_reset_email(
        &self,
        to_email: &str,
        display_name: &str,
        reset_link: &str,
    ) -> Result<(), AuthError> {
        let subject = "Password Reset Request";
        let body = format!(
            r#"
            <html>
            <body>
                <h2>Password Reset</h2>
                <p>Hello {},</p>
                <p>We received a request to reset your password. Follow this link to choose a new one:</p>
                <p><a href="{}">{}</a></p>
                <p>If you didn't request a password reset, please ignore this email.</p>
                <br>
                <p>Best regards,<br>The DentalCare Team</p>
            </body>
            </html>
            "#,
            display_name, reset_link, reset_link
        );

        self.send_email(to_email, subject, &body).await
    }

    async fn send_email(&self, to_email: &str, subject: &str, body: &str) -> Result<(), AuthError> {
        let to_mailbox: Mailbox = to_email
            .parse()
            .map_err(|e| AuthError::MailError(format!("Invalid recipient email: {}", e)))?;

        let email = Message::builder()
            .from(self.from_mailbox.clone())
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body.to_string())
            .map_err(|e| AuthError::MailError(format!("Failed to build email: {}", e)))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| AuthError::MailError(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}
