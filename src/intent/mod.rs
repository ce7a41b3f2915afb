//! Intent Resolution
//!
//! Classifies a free-text command into an [`Intent`] with an ordered keyword rule
//! list. The first rule whose trigger appears in the lower-cased text wins:
//!
//! ```text
//! 1. "balance", "how much"          -> CheckBalance
//! 2. "wallet address", "my address" -> CheckAddress
//! 3. "transaction", "history"       -> ListTransactions
//! 4. "send", "pay", "transfer"      -> SendPayment (amount + recipient extracted)
//! 5. anything else                  -> Unknown
//! ```
//!
//! This is a best-effort classifier, not a language model. Resolution is a pure
//! function of the text, the session and the known alias names.

pub mod extract;

use crate::payment::AmountError;
use crate::session::Session;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// Alias names recognised even when nothing is configured
pub const DEFAULT_ALIAS_NAMES: [&str; 3] = ["alice", "bob", "merchant"];

/// Who a payment goes to, as written by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RecipientRef {
    /// Literal on-chain address, kept exactly as typed
    Address(String),
    /// Lower-cased alias or username, resolved through the directory
    Name(String),
}

impl RecipientRef {
    /// Recipient typed into a form field: `0x...` is an address, anything else a name
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("0x") || raw.starts_with("0X") {
            RecipientRef::Address(raw.to_string())
        } else {
            RecipientRef::Name(raw.trim_start_matches('@').to_lowercase())
        }
    }
}

impl std::fmt::Display for RecipientRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecipientRef::Address(a) => write!(f, "{}", a),
            RecipientRef::Name(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    CheckBalance,
    CheckAddress,
    ListTransactions,
    SendPayment {
        amount: String,
        recipient: Option<RecipientRef>,
    },
    Unknown,
}

/// Tag of an [`Intent`] without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    CheckBalance,
    CheckAddress,
    ListTransactions,
    SendPayment,
    Unknown,
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::CheckBalance => IntentKind::CheckBalance,
            Intent::CheckAddress => IntentKind::CheckAddress,
            Intent::ListTransactions => IntentKind::ListTransactions,
            Intent::SendPayment { .. } => IntentKind::SendPayment,
            Intent::Unknown => IntentKind::Unknown,
        }
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntentKind::CheckBalance => write!(f, "check_balance"),
            IntentKind::CheckAddress => write!(f, "check_address"),
            IntentKind::ListTransactions => write!(f, "list_transactions"),
            IntentKind::SendPayment => write!(f, "send_payment"),
            IntentKind::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIntent {
    pub intent: Intent,
    /// Set when a wallet query arrives without a session; the caller should ask the
    /// user to log in instead of resolving anything.
    pub requires_auth: bool,
}

/// Ordered rule table
const RULES: [(IntentKind, &[&str]); 4] = [
    (IntentKind::CheckBalance, &["balance", "how much"]),
    (IntentKind::CheckAddress, &["wallet address", "my address"]),
    (IntentKind::ListTransactions, &["transaction", "history"]),
    (IntentKind::SendPayment, &["send", "pay", "transfer"]),
];

pub struct IntentResolver {
    aliases: BTreeSet<String>,
}

impl Default for IntentResolver {
    fn default() -> Self {
        Self::new(std::iter::empty::<String>())
    }
}

impl IntentResolver {
    /// Known alias names are the defaults plus `extra_aliases` (lower-cased)
    pub fn new<I, S>(extra_aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut aliases: BTreeSet<String> = DEFAULT_ALIAS_NAMES.iter().map(|a| a.to_string()).collect();
        aliases.extend(extra_aliases.into_iter().map(|a| a.as_ref().trim().to_lowercase()));
        aliases.retain(|a| !a.is_empty());
        Self { aliases }
    }

    /// Match the text against the rule table
    pub fn classify(text: &str) -> IntentKind {
        let lower = text.to_lowercase();
        RULES
            .iter()
            .find(|(_, triggers)| triggers.iter().any(|t| lower.contains(t)))
            .map(|(kind, _)| *kind)
            .unwrap_or(IntentKind::Unknown)
    }

    /// Build the intent for `text`.
    ///
    /// Fails only for a payment command without any number in it; the caller should
    /// prompt for an amount.
    pub fn resolve(&self, text: &str, session: Option<&Session>) -> Result<ResolvedIntent, AmountError> {
        let kind = Self::classify(text);

        let intent = match kind {
            IntentKind::CheckBalance => Intent::CheckBalance,
            IntentKind::CheckAddress => Intent::CheckAddress,
            IntentKind::ListTransactions => Intent::ListTransactions,
            IntentKind::Unknown => Intent::Unknown,
            IntentKind::SendPayment => {
                let amount = extract::amount(text).ok_or(AmountError::Missing)?;
                let recipient = extract::recipient(text, &self.aliases);
                Intent::SendPayment { amount, recipient }
            }
        };

        // SendPayment is checked by the pipeline before any lookup instead
        let requires_auth = session.is_none() && kind != IntentKind::SendPayment;

        debug!(intent = %kind, requires_auth, "Resolved intent");
        Ok(ResolvedIntent { intent, requires_auth })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Account;

    const BOB_ADDR: &str = "0xBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB";

    fn session() -> Session {
        Session::new(
            "alice",
            Account {
                wallet_id: "w1".to_string(),
                address: "0x0263fd91c595ed132686147abb8fe8b39564b72b".to_string(),
            },
        )
    }

    fn resolve(text: &str) -> Intent {
        IntentResolver::default().resolve(text, Some(&session())).unwrap().intent
    }

    #[test]
    fn test_send_with_alias() {
        assert_eq!(
            resolve("send 10 USDC to bob"),
            Intent::SendPayment {
                amount: "10".into(),
                recipient: Some(RecipientRef::Name("bob".into())),
            }
        );
    }

    #[test]
    fn test_amount_is_first_number() {
        for (text, expected) in [
            ("pay alice 2.5 then 7", "2.5"),
            ("Transfer $42 to merchant", "42"),
            ("please send 0.75 usdc to bob, thanks 3x", "0.75"),
            ("send 1,000 to bob", "1000"),
        ] {
            match resolve(text) {
                Intent::SendPayment { amount, .. } => assert_eq!(amount, expected, "{}", text),
                other => panic!("{} resolved to {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_balance_wins_over_numbers_and_sends() {
        assert_eq!(resolve("what's my balance after 20 days"), Intent::CheckBalance);
        assert_eq!(resolve("how much did I get"), Intent::CheckBalance);
        assert_eq!(resolve("send my balance to bob"), Intent::CheckBalance);
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(resolve("show my wallet address"), Intent::CheckAddress);
        assert_eq!(resolve("what is my address"), Intent::CheckAddress);
        assert_eq!(resolve("show transaction history"), Intent::ListTransactions);
        assert_eq!(resolve("list my transactions for payments"), Intent::ListTransactions);
        assert_eq!(resolve("hello there"), Intent::Unknown);
    }

    #[test]
    fn test_literal_address_kept_verbatim() {
        let text = format!("send 3 to {}", BOB_ADDR);
        assert_eq!(
            resolve(&text),
            Intent::SendPayment {
                amount: "3".into(),
                recipient: Some(RecipientRef::Address(BOB_ADDR.into())),
            }
        );
    }

    #[test]
    fn test_address_digits_are_not_the_amount() {
        let text = format!("send to {} 12 usdc", BOB_ADDR.to_lowercase());
        match resolve(&text) {
            Intent::SendPayment { amount, .. } => assert_eq!(amount, "12"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_name_after_to() {
        assert_eq!(
            resolve("pay 5 to unknownperson123"),
            Intent::SendPayment {
                amount: "5".into(),
                recipient: Some(RecipientRef::Name("unknownperson123".into())),
            }
        );
    }

    #[test]
    fn test_send_without_recipient() {
        assert_eq!(
            resolve("send 10 usdc"),
            Intent::SendPayment { amount: "10".into(), recipient: None }
        );
    }

    #[test]
    fn test_send_without_amount_fails() {
        let result = IntentResolver::default().resolve("send money to bob", Some(&session()));
        assert_eq!(result, Err(AmountError::Missing));
    }

    #[test]
    fn test_configured_alias_recognised() {
        let resolver = IntentResolver::new(["Carol"]);
        let resolved = resolver.resolve("pay carol 4", Some(&session())).unwrap();
        assert_eq!(
            resolved.intent,
            Intent::SendPayment {
                amount: "4".into(),
                recipient: Some(RecipientRef::Name("carol".into())),
            }
        );
    }

    #[test]
    fn test_parse_form_recipient() {
        assert_eq!(RecipientRef::parse(" @Bob "), RecipientRef::Name("bob".into()));
        assert_eq!(
            RecipientRef::parse(BOB_ADDR),
            RecipientRef::Address(BOB_ADDR.into())
        );
    }

    #[test]
    fn test_requires_auth_flag() {
        let resolver = IntentResolver::default();
        for text in ["what's my balance", "my address?", "show history"] {
            let resolved = resolver.resolve(text, None).unwrap();
            assert!(resolved.requires_auth, "{}", text);
            assert!(!resolver.resolve(text, Some(&session())).unwrap().requires_auth);
        }
        assert!(resolver.resolve("good morning", None).unwrap().requires_auth);
        assert!(!resolver.resolve("good morning", Some(&session())).unwrap().requires_auth);
        assert!(!resolver.resolve("send 5 to bob", None).unwrap().requires_auth);
    }
}
