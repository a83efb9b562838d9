//! Recognised tag vocabularies offered to clients as pick lists.
//!
//! Nothing on the server rejects a tag outside these lists.

use serde::Serialize;

pub const LANGUAGES: &[&str] = &[
  "Português", "Inglês", "Espanhol", "Francês",
  "Alemão", "Italiano", "Japonês", "Mandarim",
];

pub const PROFILE_INTERESTS: &[&str] = &[
  "Fotografia", "Esportes", "Arte", "Música",
  "Culinária", "História", "Compras", "Vida noturna",
  "Natureza", "Aventura", "Cultura", "Praia",
];

pub const TRIP_INTERESTS: &[&str] = &[
  "Fotografia", "Esportes", "Arte", "Música",
  "Culinária", "História", "Compras", "Vida noturna",
];

pub const TRAVEL_STYLES: &[&str] = &[
  "Aventura", "Relaxamento", "Cultural", "Gastronômico",
  "Festa", "Natureza", "Urbano", "Praia",
];

/// All pick lists, in the shape returned by `GET /vocabulary`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Vocabulary {
  pub languages:         &'static [&'static str],
  pub profile_interests: &'static [&'static str],
  pub trip_interests:    &'static [&'static str],
  pub travel_styles:     &'static [&'static str],
}

pub const VOCABULARY: Vocabulary = Vocabulary {
  languages:         LANGUAGES,
  profile_interests: PROFILE_INTERESTS,
  trip_interests:    TRIP_INTERESTS,
  travel_styles:     TRAVEL_STYLES,
};
