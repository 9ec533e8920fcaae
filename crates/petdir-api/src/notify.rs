//! Code delivery that writes to the log instead of sending mail or SMS.

use petdir_core::workflow::{CodeDelivery, CodeNotifier, Destination};

/// Logs every issued code under the `petdir::outbox` target.
///
/// Meant for development and for deployments where an outside process tails
/// the log and relays codes.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl CodeNotifier for TracingNotifier {
  fn deliver(&self, delivery: &CodeDelivery<'_>) {
    let claim_id = delivery.claim.claim_id;
    match &delivery.destination {
      Destination::Email(address) => tracing::info!(
        target: "petdir::outbox",
        %claim_id,
        email = %address,
        code = delivery.code,
        "verification code issued"
      ),
      Destination::Phone(number) => tracing::info!(
        target: "petdir::outbox",
        %claim_id,
        phone = %number,
        code = delivery.code,
        "verification code issued"
      ),
    }
  }
}
