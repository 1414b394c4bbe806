//! DTO → Domain model conversion with validation.

use crate::elements::{ElementDescriptor, MatchMode};
use crate::error::ModelError;
use crate::matcher::CompiledPattern;
use crate::rules::{
    DefaultPolicy, ElementTypesRule, EntryPointRule, ExternalRule, ExternalSelector, NoIgnoredRule,
    NoPrivateRule, NoUnknownFilesRule, NoUnknownRule, RuleEntry,
};
use crate::selector::{normalize, OneOrMany, RawSelector, Selector};
use crate::settings::{FlagAsExternal, Settings};
use crate::types::Severity;

use super::dto::{
    BoundariesConfigDto, ElementDto, ExternalOptionsDto, FlagAsExternalDto, RawExternalSelector,
    RuleDto, RuleFamilyDto, SettingsDto, ToggleDto,
};
use super::{BoundariesConfig, RuleFamilies};

/// Errors during DTO → Domain conversion.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A field-level validation error.
    #[error("{context}: {source}")]
    Validation {
        /// Where the error occurred (e.g., "elements[0].pattern").
        context: String,
        /// The underlying model error.
        source: ModelError,
    },

    /// Unknown severity string.
    #[error("{context}: unknown severity `{value}`, expected: error, warning, info")]
    UnknownSeverity {
        /// Where the error occurred.
        context: String,
        /// The invalid value.
        value: String,
    },

    /// Unknown default policy string.
    #[error("{context}: unknown default `{value}`, expected: allow, disallow")]
    UnknownPolicy {
        /// Where the error occurred.
        context: String,
        /// The invalid value.
        value: String,
    },

    /// Unknown element match mode.
    #[error("{context}: unknown mode `{value}`, expected: folder, file, full")]
    UnknownMode {
        /// Where the error occurred.
        context: String,
        /// The invalid value.
        value: String,
    },

    /// A rule uses the subject field of another family.
    #[error("{context}: `{field}` is not supported here, use `{expected}`")]
    WrongSubject {
        /// Which rule.
        context: String,
        /// The field that was set.
        field: &'static str,
        /// The field this family expects.
        expected: &'static str,
    },

    /// Cross-reference errors from aggregate root construction.
    #[error("configuration validation errors:\n{}", format_errors(.0))]
    CrossRef(Vec<ModelError>),
}

fn format_errors(errors: &[ModelError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn validation(context: impl Into<String>) -> impl FnOnce(ModelError) -> LoadError {
    let context = context.into();
    move |source| LoadError::Validation { context, source }
}

/// Converts a `BoundariesConfigDto` to a validated `BoundariesConfig`.
///
/// # Errors
///
/// Returns the first field error encountered, or every cross-reference
/// error at once.
pub fn load(dto: BoundariesConfigDto) -> Result<BoundariesConfig, LoadError> {
    let elements = dto
        .elements
        .into_iter()
        .enumerate()
        .map(|(i, e)| convert_element(e, i))
        .collect::<Result<Vec<_>, _>>()?;
    let settings = convert_settings(dto.settings, elements)?;

    let families = RuleFamilies {
        element_types: dto.element_types.map(convert_element_types).transpose()?,
        entry_point: dto.entry_point.map(convert_entry_point).transpose()?,
        external: dto.external.map(convert_external).transpose()?,
        no_private: match dto.no_private {
            Some(np) if np.enabled => Some(
                NoPrivateRule::new(np.allow_uncles)
                    .with_message(np.message)
                    .with_severity(parse_severity(np.severity.as_deref(), "no-private")?),
            ),
            _ => None,
        },
        no_unknown: convert_toggle(dto.no_unknown, "no-unknown")?.map(|(message, severity)| {
            NoUnknownRule::default()
                .with_message(message)
                .with_severity(severity)
        }),
        no_ignored: convert_toggle(dto.no_ignored, "no-ignored")?.map(|(message, severity)| {
            NoIgnoredRule::default()
                .with_message(message)
                .with_severity(severity)
        }),
        no_unknown_files: convert_toggle(dto.no_unknown_files, "no-unknown-files")?.map(
            |(message, severity)| {
                NoUnknownFilesRule::default()
                    .with_message(message)
                    .with_severity(severity)
            },
        ),
    };

    BoundariesConfig::new(settings, families).map_err(LoadError::CrossRef)
}

fn convert_element(dto: ElementDto, index: usize) -> Result<ElementDescriptor, LoadError> {
    let ctx = format!("elements[{index}]");
    let mode = match dto.mode.as_deref() {
        None | Some("folder") => MatchMode::Folder,
        Some("file") => MatchMode::File,
        Some("full") => MatchMode::Full,
        Some(other) => {
            return Err(LoadError::UnknownMode {
                context: format!("{ctx}.mode"),
                value: other.to_string(),
            })
        }
    };

    let descriptor =
        ElementDescriptor::new(dto.element_type, dto.pattern.into_vec(), mode, dto.capture)
            .map_err(validation(ctx.clone()))?;
    match dto.base_pattern {
        Some(base) => descriptor
            .with_base_pattern(base, dto.base_capture)
            .map_err(validation(ctx)),
        None => Ok(descriptor),
    }
}

fn convert_settings(
    dto: SettingsDto,
    elements: Vec<ElementDescriptor>,
) -> Result<Settings, LoadError> {
    let mut settings = Settings::new(elements)
        .with_include(dto.include)
        .map_err(validation("settings"))?
        .with_ignore(dto.ignore)
        .map_err(validation("settings"))?;
    if let Some(root) = dto.root_path {
        settings = settings.with_root_path(root);
    }
    if let Some(modules) = dto.built_in_modules {
        settings = settings.with_built_in_modules(modules);
    }
    if let Some(policy) = dto.flag_as_external {
        settings = settings
            .with_flag_as_external(convert_flag_as_external(policy))
            .map_err(validation("settings"))?;
    }
    Ok(settings)
}

fn convert_flag_as_external(dto: FlagAsExternalDto) -> FlagAsExternal {
    let defaults = FlagAsExternal::default();
    FlagAsExternal {
        unresolvable_alias: dto.unresolvable_alias.unwrap_or(defaults.unresolvable_alias),
        in_node_modules: dto.in_node_modules.unwrap_or(defaults.in_node_modules),
        outside_root_path: dto.outside_root_path.unwrap_or(defaults.outside_root_path),
        custom_source_patterns: dto.custom_source_patterns,
    }
}

// ────────────────────────────────────────────
// Rule families
// ────────────────────────────────────────────

/// Family-level fields shared by all ordered-rule families.
struct FamilyHeader {
    default: DefaultPolicy,
    message: Option<String>,
    severity: Severity,
}

fn convert_header<T>(dto: &RuleFamilyDto<T>, family: &str) -> Result<FamilyHeader, LoadError> {
    let default = match dto.default.as_deref() {
        None => DefaultPolicy::Disallow,
        Some(value) => value.parse::<DefaultPolicy>().map_err(|value| LoadError::UnknownPolicy {
            context: format!("{family}.default"),
            value,
        })?,
    };
    Ok(FamilyHeader {
        default,
        message: dto.message.clone(),
        severity: parse_severity(dto.severity.as_deref(), family)?,
    })
}

/// Which field carries a family's subject selectors.
#[derive(Clone, Copy)]
enum SubjectField {
    From,
    Target,
}

impl SubjectField {
    fn name(self) -> &'static str {
        match self {
            Self::From => "from",
            Self::Target => "target",
        }
    }
}

fn convert_rules<T, U>(
    rules: Vec<RuleDto<T>>,
    family: &str,
    subject_field: SubjectField,
    convert_entry: impl Fn(T, &str) -> Result<Vec<U>, LoadError>,
) -> Result<Vec<RuleEntry<U>>, LoadError> {
    rules
        .into_iter()
        .enumerate()
        .map(|(i, rule)| {
            let ctx = format!("{family}.rules[{i}]");
            let (subject, misplaced) = match subject_field {
                SubjectField::From => (rule.from, rule.target.map(|_| "target")),
                SubjectField::Target => (rule.target, rule.from.map(|_| "from")),
            };
            if let Some(field) = misplaced {
                return Err(LoadError::WrongSubject {
                    context: ctx,
                    field,
                    expected: subject_field.name(),
                });
            }

            let subject = subject.map(normalize).unwrap_or_default();
            validate_selectors(&subject, &format!("{ctx}.{}", subject_field.name()))?;

            let convert_list = |list: Option<super::dto::ListOrOne<T>>, field: &str| {
                let field_ctx = format!("{ctx}.{field}");
                list.map(super::dto::ListOrOne::into_vec)
                    .unwrap_or_default()
                    .into_iter()
                    .enumerate()
                    .map(|(j, entry)| convert_entry(entry, &format!("{field_ctx}[{j}]")))
                    .collect::<Result<Vec<_>, _>>()
                    .map(|lists| lists.into_iter().flatten().collect::<Vec<U>>())
            };
            let allow = convert_list(rule.allow, "allow")?;
            let disallow = convert_list(rule.disallow, "disallow")?;

            if let Some(kind) = &rule.import_kind {
                validate_pattern(kind, &format!("{ctx}.import-kind"))?;
            }

            RuleEntry::new(ctx.clone(), subject_field.name(), subject, allow, disallow)
                .map_err(validation(ctx))
                .map(|entry| entry.with_import_kind(rule.import_kind).with_message(rule.message))
        })
        .collect()
}

fn convert_element_types(dto: RuleFamilyDto<RawSelector>) -> Result<ElementTypesRule, LoadError> {
    let header = convert_header(&dto, "element-types")?;
    let rules = convert_rules(dto.rules, "element-types", SubjectField::From, |raw, ctx| {
        let selectors = normalize(raw);
        validate_selectors(&selectors, ctx)?;
        Ok(selectors)
    })?;
    Ok(ElementTypesRule::new(header.default, rules)
        .with_message(header.message)
        .with_severity(header.severity))
}

fn convert_entry_point(dto: RuleFamilyDto<OneOrMany>) -> Result<EntryPointRule, LoadError> {
    let header = convert_header(&dto, "entry-point")?;
    let rules = convert_rules(dto.rules, "entry-point", SubjectField::Target, |raw, ctx| {
        let patterns = raw.into_vec();
        for pattern in &patterns {
            validate_pattern(pattern, ctx)?;
        }
        Ok(patterns)
    })?;
    Ok(EntryPointRule::new(header.default, rules)
        .with_message(header.message)
        .with_severity(header.severity))
}

fn convert_external(dto: RuleFamilyDto<RawExternalSelector>) -> Result<ExternalRule, LoadError> {
    let header = convert_header(&dto, "external")?;
    let rules = convert_rules(dto.rules, "external", SubjectField::From, |raw, ctx| {
        let (module, options) = match raw {
            RawExternalSelector::Module(module) => (module, ExternalOptionsDto::default()),
            RawExternalSelector::WithOptions(module, options) => (module, options),
        };
        let path = options.path.map(OneOrMany::into_vec).unwrap_or_default();
        for pattern in std::iter::once(&module)
            .chain(&options.specifiers)
            .chain(&path)
        {
            validate_pattern(pattern, ctx)?;
        }
        Ok(vec![ExternalSelector::module(module)
            .with_specifiers(options.specifiers)
            .with_path(path)])
    })?;
    Ok(ExternalRule::new(header.default, rules)
        .with_message(header.message)
        .with_severity(header.severity))
}

fn convert_toggle(
    dto: Option<ToggleDto>,
    family: &str,
) -> Result<Option<(Option<String>, Severity)>, LoadError> {
    match dto {
        Some(toggle) if toggle.enabled => {
            let severity = parse_severity(toggle.severity.as_deref(), family)?;
            Ok(Some((toggle.message, severity)))
        }
        _ => Ok(None),
    }
}

fn validate_selectors(selectors: &[Selector], context: &str) -> Result<(), LoadError> {
    for selector in selectors {
        validate_pattern(&selector.element_type, context)?;
        for (name, patterns) in &selector.captured {
            for pattern in patterns {
                validate_pattern(pattern, &format!("{context}.{name}"))?;
            }
        }
    }
    Ok(())
}

fn validate_pattern(pattern: &str, context: &str) -> Result<(), LoadError> {
    CompiledPattern::new(pattern)
        .map(|_| ())
        .map_err(|e| LoadError::Validation {
            context: context.to_string(),
            source: ModelError::InvalidPattern {
                context: format!("`{pattern}`"),
                source: e,
            },
        })
}

fn parse_severity(value: Option<&str>, context: &str) -> Result<Severity, LoadError> {
    match value {
        None => Ok(Severity::Error),
        Some(value) => value.parse().map_err(|value| LoadError::UnknownSeverity {
            context: context.to_string(),
            value,
        }),
    }
}
