// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Porchlight QA router: TOML model structs,
//! layered loading via Figment, and startup validation.

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::PorchlightConfig;
pub use validation::validate;
