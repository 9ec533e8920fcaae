//! User-facing messages for the claim flow, keyed by locale.
//!
//! Dutch is the default locale of the directory; English is available for
//! clients that ask for it through `Accept-Language`.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  EnumString,
  AsRefStr,
  Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Locale {
  #[default]
  Nl,
  En,
}

impl Locale {
  /// Pick the first supported language from an `Accept-Language` value,
  /// honouring list order but ignoring q-weights.
  pub fn from_accept_language(header: &str) -> Option<Self> {
    header.split(',').find_map(|entry| {
      let tag = entry.split(';').next()?.trim();
      let primary = tag.split(['-', '_']).next()?;
      primary.parse().ok()
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
  CodeSent,
  ClaimApproved,
  AwaitingReview,
  AlreadyVerified,
  InvalidState,
  CodeExpired,
  AttemptsExhausted,
  InvalidCode { remaining: u32 },
  MissingCode,
  ClaimNotFound,
  ListingNotFound,
  UserNotFound,
  EmailInUse,
  Unauthenticated,
  Internal,
}

impl Message {
  pub fn render(self, locale: Locale) -> String {
    match locale {
      Locale::Nl => self.dutch(),
      Locale::En => self.english(),
    }
  }

  fn dutch(self) -> String {
    match self {
      Self::CodeSent => "Er is een verificatiecode verstuurd.".into(),
      Self::ClaimApproved => {
        "Je claim is goedgekeurd! Je kunt nu je bedrijfsprofiel beheren.".into()
      }
      Self::AwaitingReview => "Je claim is geverifieerd en wacht op goedkeuring \
                               door een beheerder. Dit duurt meestal 1-2 \
                               werkdagen."
        .into(),
      Self::AlreadyVerified => "Deze claim is al geverifieerd.".into(),
      Self::InvalidState => "Deze claim kan niet worden geverifieerd.".into(),
      Self::CodeExpired => {
        "De verificatiecode is verlopen. Vraag een nieuwe code aan.".into()
      }
      Self::AttemptsExhausted => "Te veel mislukte pogingen. Neem contact op \
                                  met support."
        .into(),
      Self::InvalidCode { remaining: 1 } => {
        "Ongeldige code. Je hebt nog 1 poging over.".into()
      }
      Self::InvalidCode { remaining } => {
        format!("Ongeldige code. Je hebt nog {remaining} pogingen over.")
      }
      Self::MissingCode => "Verificatiecode is verplicht.".into(),
      Self::ClaimNotFound => "Claim niet gevonden.".into(),
      Self::ListingNotFound => "Locatie niet gevonden.".into(),
      Self::UserNotFound => "Gebruiker niet gevonden.".into(),
      Self::EmailInUse => "Dit e-mailadres is al in gebruik.".into(),
      Self::Unauthenticated => "Je moet ingelogd zijn.".into(),
      Self::Internal => "Er is iets misgegaan. Probeer het later opnieuw.".into(),
    }
  }

  fn english(self) -> String {
    match self {
      Self::CodeSent => "A verification code has been sent.".into(),
      Self::ClaimApproved => {
        "Your claim has been approved! You can now manage your business \
         profile."
          .into()
      }
      Self::AwaitingReview => "Your claim has been verified and is awaiting \
                               approval by an administrator. This usually \
                               takes 1-2 business days."
        .into(),
      Self::AlreadyVerified => "This claim has already been verified.".into(),
      Self::InvalidState => "This claim cannot be verified.".into(),
      Self::CodeExpired => {
        "The verification code has expired. Please request a new code.".into()
      }
      Self::AttemptsExhausted => {
        "Too many failed attempts. Please contact support.".into()
      }
      Self::InvalidCode { remaining: 1 } => {
        "Invalid code. You have 1 attempt remaining.".into()
      }
      Self::InvalidCode { remaining } => {
        format!("Invalid code. You have {remaining} attempts remaining.")
      }
      Self::MissingCode => "A verification code is required.".into(),
      Self::ClaimNotFound => "Claim not found.".into(),
      Self::ListingNotFound => "Listing not found.".into(),
      Self::UserNotFound => "User not found.".into(),
      Self::EmailInUse => "This email address is already in use.".into(),
      Self::Unauthenticated => "You must be signed in.".into(),
      Self::Internal => "Something went wrong. Please try again later.".into(),
    }
  }
}
