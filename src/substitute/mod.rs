//! Variable substitution in strings and byte streams.

mod encoding;
mod escape;
mod reader;
mod token;

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Read, Write};
use std::str::FromStr;

pub use encoding::Encoding;
pub use reader::SubstitutingReader;

use crate::filter::{FilterChain, FilterSpec, SubstitutionFilter};
use crate::{ConfigurationError, Snapshot, VariableStore};
use token::Syntax;

/// Token syntax and value escaping of a substituted resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SubstitutionType {
    /// `$NAME` / `${NAME}`, values inserted as-is.
    #[default]
    Plain,
    /// Shell scripts: same tokens, no escaping.
    Shell,
    /// Ant build files: same tokens, no escaping.
    Ant,
    /// Java `.properties`: values escaped, ISO-8859-1 by default.
    JavaProperties,
    /// XML documents: values entity-escaped.
    Xml,
    /// `@NAME@` tokens, values inserted as-is.
    At,
}

impl SubstitutionType {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Shell => "shell",
            Self::Ant => "ant",
            Self::JavaProperties => "javaprop",
            Self::Xml => "xml",
            Self::At => "at",
        }
    }

    /// Encoding used for streams when the caller does not name one.
    #[must_use]
    pub fn default_encoding(self) -> Encoding {
        match self {
            Self::JavaProperties => Encoding::Latin1,
            _ => Encoding::Utf8,
        }
    }

    fn syntax(self, braces_required: bool) -> Syntax {
        match self {
            Self::At => Syntax::At,
            _ => Syntax::Dollar { braces_required },
        }
    }

    fn escape(self, value: String) -> String {
        match self {
            Self::JavaProperties => escape::java_properties(&value),
            Self::Xml => escape::xml(&value),
            Self::Plain | Self::Shell | Self::Ant | Self::At => value,
        }
    }
}

impl FromStr for SubstitutionType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" => Ok(Self::Plain),
            "shell" => Ok(Self::Shell),
            "ant" => Ok(Self::Ant),
            "javaprop" | "java_properties" | "properties" => Ok(Self::JavaProperties),
            "xml" => Ok(Self::Xml),
            "at" => Ok(Self::At),
            _ => Err(ConfigurationError::UnknownSubstitutionType { name: s.to_owned() }),
        }
    }
}

impl fmt::Display for SubstitutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Builder for a [`VariableSubstitutor`]. Filters are validated in
/// [`build`](Self::build).
pub struct SubstitutorBuilder {
    store: VariableStore,
    kind: SubstitutionType,
    braces_required: bool,
    filters: Vec<(String, Result<Box<dyn SubstitutionFilter>, ConfigurationError>)>,
}

impl SubstitutorBuilder {
    #[must_use]
    pub fn substitution_type(mut self, kind: SubstitutionType) -> Self {
        self.kind = kind;
        self
    }

    /// Only substitute `${NAME}`; bare `$NAME` passes through.
    #[must_use]
    pub fn braces_required(mut self, required: bool) -> Self {
        self.braces_required = required;
        self
    }

    /// Append `filter` to the chain for `variable`.
    #[must_use]
    pub fn filter(mut self, variable: &str, filter: impl SubstitutionFilter + 'static) -> Self {
        self.filters.push((variable.to_owned(), Ok(Box::new(filter))));
        self
    }

    /// Append the filter `spec` names to the chain for `variable`.
    #[must_use]
    pub fn filter_spec(mut self, variable: &str, spec: &FilterSpec) -> Self {
        self.filters.push((variable.to_owned(), spec.build()));
        self
    }

    /// # Errors
    ///
    /// Returns the first filter that is unknown or fails validation.
    pub fn build(self) -> Result<VariableSubstitutor, ConfigurationError> {
        let mut filters: HashMap<String, FilterChain> = HashMap::new();
        for (variable, filter) in self.filters {
            filters.entry(variable).or_default().push(filter?)?;
        }
        tracing::debug!(
            kind = %self.kind,
            braces_required = self.braces_required,
            filtered_variables = filters.len(),
            "built substitutor"
        );
        Ok(VariableSubstitutor {
            store: self.store,
            kind: self.kind,
            braces_required: self.braces_required,
            filters,
        })
    }
}

impl fmt::Debug for SubstitutorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubstitutorBuilder")
            .field("kind", &self.kind)
            .field("braces_required", &self.braces_required)
            .field("filters", &self.filters.len())
            .finish()
    }
}

/// Replaces variable references with current values from a
/// [`VariableStore`].
///
/// # Example
///
/// ```
/// use installer_core::{SubstitutionType, VariableStore, VariableSubstitutor};
///
/// let store = VariableStore::new().with("INSTALL_PATH", r"C:\Apps\Demo");
/// let sub = VariableSubstitutor::builder(store)
///     .substitution_type(SubstitutionType::JavaProperties)
///     .build()
///     .unwrap();
///
/// assert_eq!(sub.substitute("home=$INSTALL_PATH"), r"home=C\:\\Apps\\Demo");
/// ```
#[derive(Debug)]
pub struct VariableSubstitutor {
    store: VariableStore,
    kind: SubstitutionType,
    braces_required: bool,
    filters: HashMap<String, FilterChain>,
}

impl VariableSubstitutor {
    /// Plain substitution with no filters.
    #[must_use]
    pub fn new(store: VariableStore) -> Self {
        Self {
            store,
            kind: SubstitutionType::Plain,
            braces_required: false,
            filters: HashMap::new(),
        }
    }

    #[must_use]
    pub fn builder(store: VariableStore) -> SubstitutorBuilder {
        SubstitutorBuilder {
            store,
            kind: SubstitutionType::Plain,
            braces_required: false,
            filters: Vec::new(),
        }
    }

    #[must_use]
    pub fn substitution_type(&self) -> SubstitutionType {
        self.kind
    }

    #[must_use]
    pub fn braces_required(&self) -> bool {
        self.braces_required
    }

    #[must_use]
    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    /// Substitute against the current store contents.
    #[must_use]
    pub fn substitute(&self, text: &str) -> String {
        self.substitute_in(text, &self.store.snapshot())
    }

    /// Copy `input` to `output`, substituting variables. `None` selects the
    /// substitution type's default encoding. Returns the bytes written.
    ///
    /// # Errors
    ///
    /// I/O errors from either side, and [`io::ErrorKind::InvalidData`] when
    /// the input is malformed in the declared encoding.
    pub fn substitute_stream<R: Read, W: Write>(
        &self,
        input: R,
        mut output: W,
        encoding: Option<Encoding>,
    ) -> io::Result<u64> {
        let mut reader = self.reader(input, encoding);
        let written = io::copy(&mut reader, &mut output)?;
        output.flush()?;
        Ok(written)
    }

    /// Wrap `input` in a reader yielding substituted bytes.
    pub fn reader<R: Read>(&self, input: R, encoding: Option<Encoding>) -> SubstitutingReader<'_, R> {
        let encoding = encoding.unwrap_or_else(|| self.kind.default_encoding());
        SubstitutingReader::new(self, input, encoding)
    }

    pub(crate) fn substitute_in(&self, text: &str, snapshot: &Snapshot) -> String {
        let syntax = self.kind.syntax(self.braces_required);
        token::replace_tokens(text, syntax, &mut |name| self.resolve(name, snapshot))
    }

    fn resolve(&self, name: &str, snapshot: &Snapshot) -> Option<String> {
        let raw = snapshot.get(name)?;
        let value = match self.filters.get(name) {
            Some(chain) => match chain.apply(raw) {
                Ok(filtered) => filtered,
                Err(e) => {
                    tracing::warn!(variable = name, error = %e, "filter failed, using unfiltered value");
                    raw.to_owned()
                }
            },
            None => raw.to_owned(),
        };
        tracing::trace!(variable = name, "resolved variable");
        Some(self.kind.escape(value))
    }
}
