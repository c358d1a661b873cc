//! Command dispatch: turns one operator command into one reply.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use keyforge_core::{License, LicenseError, LicenseStatus, LicenseType, normalize_key};

use super::commands::Command;
use super::types::User;
use crate::config::Operators;
use crate::service::{Inspection, LicenseService};

pub const ACCESS_DENIED: &str = "Access denied.";
pub const UNAVAILABLE: &str = "Service unavailable, try again later.";
pub const NO_KEYS: &str = "No keys.";
pub const KEY_NOT_FOUND: &str = "Key not found.";

const USAGE_GENERATE: &str = "Usage: /generate <month|year|lifetime>";
const USAGE_BAN: &str = "Usage: /ban <key>";
const USAGE_VERIFY: &str = "Usage: /verify <key>";

const OPERATOR_HELP: &str = "Available commands:\n\
/generate <month|year|lifetime> - issue a new key\n\
/ban <key> - ban a key\n\
/list - list all keys\n\
/verify <key> - show a key's status";

const EXPIRY_FORMAT: &str = "%d.%m.%Y %H:%M";

#[derive(Clone)]
pub struct CommandHandler {
    service: LicenseService,
    operators: Operators,
    public_greeting: String,
}

impl CommandHandler {
    pub const fn new(
        service: LicenseService,
        operators: Operators,
        public_greeting: String,
    ) -> Self {
        Self {
            service,
            operators,
            public_greeting,
        }
    }

    /// Reply to `text` sent by `from`, or `None` when the message is not a
    /// command this bot answers.
    pub async fn handle(&self, from: &User, text: &str) -> Option<String> {
        let command = Command::parse(text)?;

        if command.is_privileged() && !self.operators.contains(from.id) {
            warn!(user_id = from.id, command = command.name(), "Command denied");
            return Some(ACCESS_DENIED.to_string());
        }
        info!(user_id = from.id, command = command.name(), "Handling command");

        let reply = match command {
            Command::Start => self.start(from),
            Command::Generate(arg) => self.generate(arg.as_deref()).await,
            Command::Ban(arg) => self.ban(arg.as_deref()).await,
            Command::List => self.list().await,
            Command::Verify(arg) => self.verify(arg.as_deref()).await,
        };
        Some(reply)
    }

    fn start(&self, from: &User) -> String {
        let body = if self.operators.contains(from.id) {
            OPERATOR_HELP
        } else {
            self.public_greeting.as_str()
        };
        format!("Hello, {}!\n\n{body}", from.mention())
    }

    async fn generate(&self, arg: Option<&str>) -> String {
        let Some(license_type) = arg.and_then(|a| a.parse::<LicenseType>().ok()) else {
            return USAGE_GENERATE.to_string();
        };

        match self.service.create_license(license_type).await {
            Ok(license) => format!(
                "Key: {}\nType: {}\nExpires: {}",
                license.key,
                license.license_type.display_name(),
                format_expiry(license.expires_at)
            ),
            Err(e) => failure_reply(&e),
        }
    }

    async fn ban(&self, arg: Option<&str>) -> String {
        let Some(raw) = arg else {
            return USAGE_BAN.to_string();
        };
        let key = normalize_key(raw);

        match self.service.ban(&key).await {
            Ok(true) => format!("Key {key} banned."),
            Ok(false) => format!("Key {key} not found, nothing changed."),
            Err(LicenseError::MissingKey) => USAGE_BAN.to_string(),
            Err(e) => failure_reply(&e),
        }
    }

    async fn list(&self) -> String {
        match self.service.list().await {
            Ok(licenses) if licenses.is_empty() => NO_KEYS.to_string(),
            Ok(licenses) => licenses
                .iter()
                .map(list_line)
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => failure_reply(&e),
        }
    }

    async fn verify(&self, arg: Option<&str>) -> String {
        let Some(key) = arg else {
            return USAGE_VERIFY.to_string();
        };

        match self.service.inspect(key).await {
            Ok(inspection) => inspection_reply(&inspection),
            Err(LicenseError::NotFound) => KEY_NOT_FOUND.to_string(),
            Err(LicenseError::MissingKey) => USAGE_VERIFY.to_string(),
            Err(e) => failure_reply(&e),
        }
    }
}

fn failure_reply(e: &LicenseError) -> String {
    warn!(error = %e, "Bot command failed");
    UNAVAILABLE.to_string()
}

fn format_expiry(expires_at: Option<DateTime<Utc>>) -> String {
    expires_at.map_or_else(
        || "Never".to_string(),
        |at| at.format(EXPIRY_FORMAT).to_string(),
    )
}

fn list_line(license: &License) -> String {
    let flag = if license.is_banned() { "BAN" } else { "OK" };
    format!(
        "{}: {}, until {}, {flag}",
        license.key,
        license.license_type.display_name(),
        format_expiry(license.expires_at)
    )
}

const fn status_label(status: LicenseStatus) -> &'static str {
    match status {
        LicenseStatus::Active => "OK",
        LicenseStatus::Banned => "BAN",
        LicenseStatus::Expired => "EXPIRED",
    }
}

fn inspection_reply(inspection: &Inspection) -> String {
    let license = &inspection.license;
    let mut reply = format!(
        "Key: {}\nType: {}\nStatus: {}\nExpires: {}",
        license.key,
        license.license_type.display_name(),
        status_label(inspection.status),
        format_expiry(license.expires_at)
    );
    if let Some(days) = inspection.days_left {
        reply.push_str(&format!("\nDays left: {days}"));
    }
    reply
}
