use crate::domain::verification::driven_ports::{CodeMailer, CodeStore};
use crate::domain::verification::driving_ports::VerificationError;
use anyhow::Context;
use rand::Rng;
use tracing::{info, warn};

/// Number of digits in a generated verification code
pub const CODE_LENGTH: usize = 6;

/// The outcome of asking for a verification code
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum CodeDelivery {
    /// The code went out over the mail transport
    Sent,
    /// The mail transport failed and demo mode is on, so the code is handed back to the caller
    Undelivered { code: String },
}

/// Generates a uniformly random code of [CODE_LENGTH] decimal digits (leading zeros allowed)
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

pub mod driven_ports {
    pub trait CodeStore {
        /// Stores [code] for [email], replacing whatever code was there before
        async fn store_code(&self, email: &str, code: &str) -> Result<(), anyhow::Error>;

        /// Removes the code for [email] only if it equals [code]. Returns whether it matched.
        async fn take_matching_code(&self, email: &str, code: &str) -> Result<bool, anyhow::Error>;
    }

    pub trait CodeMailer {
        async fn send_code(&self, email: &str, code: &str) -> Result<(), anyhow::Error>;
    }

    /// An unconfigured mail transport never delivers anything
    impl<M: CodeMailer> CodeMailer for Option<M> {
        async fn send_code(&self, email: &str, code: &str) -> Result<(), anyhow::Error> {
            match self {
                Some(mailer) => mailer.send_code(email, code).await,
                None => Err(anyhow::anyhow!("no mail transport is configured")),
            }
        }
    }
}

pub mod driving_ports {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum VerificationError {
        #[error("Invalid verification code")]
        InvalidCode,
        #[error("could not deliver the verification code: {0}")]
        DeliveryFailed(anyhow::Error),
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    pub trait VerificationPort {
        /// Issues a fresh code for [email] and tries to mail it. When mailing fails and
        /// [demo_fallback] is set, the code comes back as [CodeDelivery::Undelivered].
        async fn request_code(
            &self,
            email: &str,
            demo_fallback: bool,
            code_store: &impl driven_ports::CodeStore,
            mailer: &impl driven_ports::CodeMailer,
        ) -> Result<CodeDelivery, VerificationError>;

        /// Consumes the stored code for [email] if [code] matches it exactly
        async fn verify_code(
            &self,
            email: &str,
            code: &str,
            code_store: &impl driven_ports::CodeStore,
        ) -> Result<(), VerificationError>;
    }
}

pub struct VerificationService {}

impl driving_ports::VerificationPort for VerificationService {
    async fn request_code(
        &self,
        email: &str,
        demo_fallback: bool,
        code_store: &impl CodeStore,
        mailer: &impl CodeMailer,
    ) -> Result<CodeDelivery, VerificationError> {
        let code = generate_code();
        code_store
            .store_code(email, &code)
            .await
            .context("storing a verification code")?;

        match mailer.send_code(email, &code).await {
            Ok(()) => {
                info!("Sent verification code to {email}");
                Ok(CodeDelivery::Sent)
            }
            Err(mail_err) if demo_fallback => {
                warn!("Mail delivery to {email} failed, returning code in demo mode: {mail_err:#}");
                Ok(CodeDelivery::Undelivered { code })
            }
            Err(mail_err) => Err(VerificationError::DeliveryFailed(mail_err)),
        }
    }

    async fn verify_code(
        &self,
        email: &str,
        code: &str,
        code_store: &impl CodeStore,
    ) -> Result<(), VerificationError> {
        let matched = code_store
            .take_matching_code(email, code)
            .await
            .context("checking a verification code")?;

        if matched {
            info!("Verified code for {email}");
            Ok(())
        } else {
            Err(VerificationError::InvalidCode)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::driving_ports::VerificationPort;
    use super::test_util::*;
    use super::*;
    use crate::persistence::mem_code_driven_ports::InMemoryCodeStore;
    use speculoos::prelude::*;

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(CODE_LENGTH, code.len());
            assert!(code.chars().all(|c| c.is_ascii_digit()), "bad code {code}");
        }
    }

    mod request_code {
        use super::*;

        #[tokio::test]
        async fn mails_the_stored_code() {
            let store = InMemoryCodeStore::new_locked();
            let mailer = FakeCodeMailer::new_locked_sending(Ok(()));

            let delivery = VerificationService {}
                .request_code("a@example.com", true, &store, &mailer)
                .await;
            assert_that!(delivery).is_ok_containing(CodeDelivery::Sent);

            let locked_mailer = mailer.lock().expect("mailer mutex poisoned");
            let [(email, code)] = locked_mailer.send_code_result.calls() else {
                panic!("Expected exactly one mail, got {:?}", locked_mailer.send_code_result.calls());
            };
            assert_eq!("a@example.com", email);
            let matched = store
                .take_matching_code(email, code)
                .await
                .expect("store should be reachable");
            assert!(matched);
        }

        #[tokio::test]
        async fn falls_back_to_demo_code_when_mail_fails() {
            let store = InMemoryCodeStore::new_locked();
            let mailer = FakeCodeMailer::new_locked_sending(Err(anyhow::anyhow!("relay down")));

            let delivery = VerificationService {}
                .request_code("a@example.com", true, &store, &mailer)
                .await;
            let Ok(CodeDelivery::Undelivered { code }) = delivery else {
                panic!("Expected the code to come back in demo mode, got {delivery:#?}");
            };

            let matched = store
                .take_matching_code("a@example.com", &code)
                .await
                .expect("store should be reachable");
            assert!(matched);
        }

        #[tokio::test]
        async fn reports_mail_failure_without_demo_fallback() {
            let store = InMemoryCodeStore::new_locked();
            let mailer = FakeCodeMailer::new_locked_sending(Err(anyhow::anyhow!("relay down")));

            let delivery = VerificationService {}
                .request_code("a@example.com", false, &store, &mailer)
                .await;
            assert_that!(delivery)
                .is_err()
                .matches(|err| matches!(err, VerificationError::DeliveryFailed(_)));
        }

        #[tokio::test]
        async fn unconfigured_mailer_counts_as_failure() {
            let store = InMemoryCodeStore::new_locked();
            let no_mailer: Option<std::sync::Mutex<FakeCodeMailer>> = None;

            let delivery = VerificationService {}
                .request_code("a@example.com", true, &store, &no_mailer)
                .await;
            assert_that!(delivery)
                .is_ok()
                .matches(|delivery| matches!(delivery, CodeDelivery::Undelivered { .. }));
        }

        #[tokio::test]
        async fn a_new_request_replaces_the_old_code() {
            let store = InMemoryCodeStore::new_locked();
            let mailer = FakeCodeMailer::new_locked_sending(Err(anyhow::anyhow!("relay down")));
            let service = VerificationService {};

            let Ok(CodeDelivery::Undelivered { code: first }) = service
                .request_code("a@example.com", true, &store, &mailer)
                .await
            else {
                panic!("first request should fall back to demo mode");
            };
            let Ok(CodeDelivery::Undelivered { code: second }) = service
                .request_code("a@example.com", true, &store, &mailer)
                .await
            else {
                panic!("second request should fall back to demo mode");
            };

            if first != second {
                let first_result = service.verify_code("a@example.com", &first, &store).await;
                assert_that!(first_result).is_err();
            }
            let second_result = service.verify_code("a@example.com", &second, &store).await;
            assert_that!(second_result).is_ok();
        }
    }

    mod verify_code {
        use super::*;

        #[tokio::test]
        async fn wrong_code_leaves_stored_code_intact() {
            let store = InMemoryCodeStore::new_locked();
            store
                .store_code("a@example.com", "123456")
                .await
                .expect("store should be reachable");
            let service = VerificationService {};

            let wrong = service.verify_code("a@example.com", "654321", &store).await;
            assert_that!(wrong)
                .is_err()
                .matches(|err| matches!(err, VerificationError::InvalidCode));

            let right = service.verify_code("a@example.com", "123456", &store).await;
            assert_that!(right).is_ok();
        }

        #[tokio::test]
        async fn codes_are_single_use() {
            let store = InMemoryCodeStore::new_locked();
            store
                .store_code("a@example.com", "123456")
                .await
                .expect("store should be reachable");
            let service = VerificationService {};

            let first = service.verify_code("a@example.com", "123456", &store).await;
            assert_that!(first).is_ok();

            let second = service.verify_code("a@example.com", "123456", &store).await;
            assert_that!(second)
                .is_err()
                .matches(|err| matches!(err, VerificationError::InvalidCode));
        }

        #[tokio::test]
        async fn emails_are_not_normalized() {
            let store = InMemoryCodeStore::new_locked();
            store
                .store_code("A@Example.com", "123456")
                .await
                .expect("store should be reachable");

            let result = VerificationService {}
                .verify_code("a@example.com", "123456", &store)
                .await;
            assert_that!(result).is_err();
        }
    }
}
