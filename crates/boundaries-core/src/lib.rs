//! # boundaries-core
//!
//! Architecture boundary engine: classifies project files into typed
//! elements, describes the dependencies between them and evaluates
//! declarative allow/disallow rules against each dependency.
//!
//! - [`Boundaries`] is the facade a host linter talks to
//! - [`ElementInfo`] is what a path classifies to
//! - [`DependencyDescription`] pairs both ends of an import with their
//!   [`Relationship`] and [`Origin`]
//! - [`Violation`] is what a rule reports
//!
//! ## Example
//!
//! ```
//! use boundaries_core::{Boundaries, DependencyEdge, Relationship};
//!
//! let engine = Boundaries::from_toml(r#"
//! [[elements]]
//! type = "modules"
//! pattern = "modules/*"
//! capture = ["name"]
//!
//! [no-private]
//! "#).unwrap();
//!
//! let edge = DependencyEdge::new("./modules/b/modules/c")
//!     .resolved("modules/a/modules/b/modules/c/index.js");
//! let dependency = engine.describe_dependency("modules/a/index.js", &edge);
//! assert_eq!(dependency.relationship, Relationship::Descendant);
//! assert_eq!(engine.evaluate_no_private(&dependency), Some(false));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod config;
pub mod dependency;
pub mod elements;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod origin;
pub mod relationship;
pub mod rules;
pub mod selector;
pub mod settings;
pub mod types;

pub use cache::{CacheError, CacheLayer, CacheSnapshot};
pub use config::{BoundariesConfig, LoadConfigError, LoadError, RuleFamilies};
pub use dependency::{DependencyDescription, DependencyEdge, ImportKind, TargetInfo};
pub use elements::{CapturedValues, ElementDescriptor, ElementInfo, MatchMode, ParentElement};
pub use engine::Boundaries;
pub use error::ModelError;
pub use matcher::{CompiledPattern, PathMatcher, PatternError};
pub use origin::{Origin, OriginInfo};
pub use relationship::Relationship;
pub use rules::{BoundaryRule, DefaultPolicy, FileRule, RuleContext, RuleVerdict};
pub use selector::Selector;
pub use settings::{FlagAsExternal, Settings};
pub use types::{LintResult, Location, Severity, Violation};
