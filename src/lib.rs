//! # oidc-hook
//!
//! OpenID Connect login for gateways that have no user agent of their own,
//! such as a VPN server's authentication hook.
//!
//! The gateway hands over an opaque artifact, `base64({"service", "code"})`,
//! obtained by a separate client that completed the browser part of the
//! authorization-code flow. This crate then:
//!
//! 1. decodes the artifact ([`artifact`]),
//! 2. resolves the provider from a static registry ([`config`]),
//! 3. fetches the provider's discovery document ([`discovery`]),
//! 4. exchanges the code and reads the email from the ID token ([`token`], [`id_token`]).
//!
//! ```rust,ignore
//! use oidc_hook::{Authenticator, HookConfig};
//!
//! let (registry, http) =
//!     HookConfig::builtin().into_parts_with_env(|k| std::env::var(k).ok())?;
//! let auth = Authenticator::new(registry, &http)?;
//! let claims = auth.authenticate(std::env::var("password")?.as_bytes()).await?;
//! println!("Welcome {} !", claims.email);
//! ```
//!
//! # Trust model
//!
//! By default the ID token claims are trusted because they were received
//! directly from the token endpoint over validated TLS. Set
//! `verify_signature = true` on a provider to additionally check the token
//! against the provider's JWKS ([`jwks`]).

pub mod artifact;
pub mod config;
pub mod discovery;
pub mod error;
pub mod flow;
pub mod id_token;
pub mod jwks;
pub mod token;

pub use artifact::AuthRequest;
pub use config::{HookConfig, HttpSettings, ProviderConfig, ProviderRegistry};
pub use discovery::DiscoveryDocument;
pub use error::{AuthError, ErrorKind, Result};
pub use flow::{AuthStage, Authenticator};
pub use id_token::IdentityClaims;
pub use token::TokenResponse;
