use std::collections::HashSet;

use regex::Regex;

use crate::error::{CcmlError, Result};

use super::xml::RawMethod;

/// Selects which source methods make it into the store.
pub trait MethodFilter {
    fn accept(&self, method: &RawMethod) -> bool;
}

/// Inclusive stage range.
pub struct StageFilter {
    pub min: u8,
    pub max: u8,
}

impl MethodFilter for StageFilter {
    fn accept(&self, method: &RawMethod) -> bool {
        method.stage >= self.min && method.stage <= self.max
    }
}

/// Matches titles either against an exact set or a regex. Exact matching
/// also tries the title with its final word (the stage name) removed, so
/// "Plain Bob" selects "Plain Bob Major" and friends.
pub enum TitleFilter {
    Exact(HashSet<String>),
    Pattern(Regex),
}

impl TitleFilter {
    pub fn exact<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Exact(titles.into_iter().map(Into::into).collect())
    }

    /// Patterns are anchored at the start of the title.
    pub fn pattern(pattern: &str) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{})", pattern))
            .map_err(|e| CcmlError::InvalidArgument(format!("bad title pattern: {}", e)))?;
        Ok(Self::Pattern(regex))
    }
}

impl MethodFilter for TitleFilter {
    fn accept(&self, method: &RawMethod) -> bool {
        match self {
            Self::Exact(titles) => {
                if titles.contains(&method.title) {
                    return true;
                }
                match method.title.rsplit_once(' ') {
                    Some((base, _)) => titles.contains(base),
                    None => false,
                }
            }
            Self::Pattern(regex) => regex.is_match(&method.title),
        }
    }
}

/// Matches the classification name and, where set, its boolean attributes.
/// A method without any classification never matches.
pub struct ClassificationFilter {
    pub classes: HashSet<String>,
    pub little: Option<bool>,
    pub differential: Option<bool>,
    pub plain: Option<bool>,
    pub treble_dodging: Option<bool>,
}

impl ClassificationFilter {
    pub fn classes<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
            little: None,
            differential: None,
            plain: None,
            treble_dodging: None,
        }
    }
}

impl MethodFilter for ClassificationFilter {
    fn accept(&self, method: &RawMethod) -> bool {
        let Some(class) = &method.classification else {
            return false;
        };
        if !self.classes.is_empty() {
            let matched = class
                .name
                .as_ref()
                .is_some_and(|name| self.classes.contains(name));
            if !matched {
                return false;
            }
        }
        let attrs = [
            (self.little, class.little),
            (self.differential, class.differential),
            (self.plain, class.plain),
            (self.treble_dodging, class.treble_dodging),
        ];
        attrs
            .iter()
            .all(|&(want, have)| want.is_none_or(|w| w == have))
    }
}

/// Accepts a method only when every inner filter does.
pub struct AllFilter {
    filters: Vec<Box<dyn MethodFilter>>,
}

impl AllFilter {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    pub fn push(&mut self, filter: Box<dyn MethodFilter>) {
        self.filters.push(filter);
    }
}

impl Default for AllFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodFilter for AllFilter {
    fn accept(&self, method: &RawMethod) -> bool {
        self.filters.iter().all(|f| f.accept(method))
    }
}
