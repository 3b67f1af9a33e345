//! Rina Core - Expression and voice command engine for a character display
//!
//! This library provides the decision logic behind the character board:
//! - Facial action-unit classification
//! - Vocal emotion group mapping
//! - Expression smoothing (mode filter, hold time, decay)
//! - Wake word and voice command recognition
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │   Face landmarker (AUs)   │   │  Prosody service (voice)  │
//! └────────────┬─────────────┘   └────────────┬─────────────┘
//!              │                               │
//! ┌────────────▼─────────────┐   ┌────────────▼─────────────┐
//! │    FacialClassifier       │   │       VocalMapper         │
//! └────────────┬─────────────┘   └────────────┬─────────────┘
//!              └───────────────┬───────────────┘
//!                ┌─────────────▼─────────────┐
//!                │    ExpressionSmoother      │──▶ renderer
//!                └────────────────────────────┘
//!
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │  Speech-to-text fragments │──▶│    CommandRecognizer      │──▶ navigation
//! └──────────────────────────┘   └──────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod expression;
pub mod face;
pub mod pipeline;
pub mod session;
pub mod smoother;
pub mod vocal;
pub mod voice;

pub use config::Config;
pub use error::{Error, Result};
pub use expression::{Expression, ExpressionCandidate};
pub use pipeline::{ExpressionChange, ExpressionPipeline};
pub use session::{Session, SessionEvent, SessionOutput};
pub use smoother::{ExpressionSmoother, SmootherConfig, SmootherSample};
