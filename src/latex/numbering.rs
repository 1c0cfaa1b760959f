//! LaTeX-style counters for theorem references.

use std::collections::{HashMap, HashSet};

use crate::extract::Declaration;

const CHAPTER: &str = "chapter";
const SECTION: &str = "section";

/// Sectional counters and the theorem environments numbered from them.
#[derive(Debug, Default)]
pub(crate) struct Numbering {
    values: HashMap<String, u32>,
    /// Counter -> counter that resets it and prefixes its display.
    within: HashMap<String, String>,
    /// Declared environment -> counter it steps, `None` when unnumbered.
    environments: HashMap<String, Option<String>>,
    chapters: bool,
    appendix: bool,
}

impl Numbering {
    pub(crate) fn new() -> Self {
        let mut numbering = Self::default();
        numbering.number_within("subsection", SECTION);
        numbering.number_within("subsubsection", "subsection");
        numbering
    }

    pub(crate) fn declare(&mut self, declaration: &Declaration) {
        if !declaration.numbered {
            self.environments
                .insert(declaration.environment.clone(), None);
            return;
        }
        let counter = declaration
            .shared_counter
            .clone()
            .unwrap_or_else(|| declaration.environment.clone());
        if declaration.shared_counter.is_none() {
            if let Some(parent) = &declaration.within {
                self.number_within(&counter, parent);
            }
        }
        self.environments
            .insert(declaration.environment.clone(), Some(counter));
    }

    pub(crate) fn number_within(&mut self, counter: &str, parent: &str) {
        self.within.insert(counter.to_owned(), parent.to_owned());
    }

    pub(crate) fn is_declared(&self, environment: &str) -> bool {
        self.environments.contains_key(environment)
    }

    /// Steps the environment's counter and returns its displayed value.
    pub(crate) fn step_environment(&mut self, environment: &str) -> Option<String> {
        let counter = self.environments.get(environment)?.clone()?;
        self.step(&counter);
        Some(self.display(&counter))
    }

    pub(crate) fn step_sectional(&mut self, level: &str) {
        if level == CHAPTER && !self.chapters {
            self.chapters = true;
            self.number_within(SECTION, CHAPTER);
        }
        self.step(level);
    }

    /// Restarts the top sectional counter and switches it to letters.
    pub(crate) fn start_appendix(&mut self) {
        self.appendix = true;
        let top = self.top_level().to_owned();
        self.values.insert(top.clone(), 0);
        self.reset_dependents(&top);
    }

    const fn top_level(&self) -> &'static str {
        if self.chapters { CHAPTER } else { SECTION }
    }

    fn step(&mut self, counter: &str) {
        *self.values.entry(counter.to_owned()).or_insert(0) += 1;
        self.reset_dependents(counter);
    }

    fn reset_dependents(&mut self, counter: &str) {
        let mut visited = HashSet::from([counter.to_owned()]);
        let mut pending = vec![counter.to_owned()];
        while let Some(parent) = pending.pop() {
            let dependents: Vec<String> = self
                .within
                .iter()
                .filter(|(child, of)| **of == parent && !visited.contains(*child))
                .map(|(child, _)| child.clone())
                .collect();
            for child in dependents {
                self.values.insert(child.clone(), 0);
                visited.insert(child.clone());
                pending.push(child);
            }
        }
    }

    fn display(&self, counter: &str) -> String {
        let mut chain = vec![counter];
        let mut visited = HashSet::from([counter]);
        let mut current = counter;
        while let Some(parent) = self.within.get(current) {
            if !visited.insert(parent.as_str()) {
                break;
            }
            chain.push(parent.as_str());
            current = parent.as_str();
        }
        chain
            .iter()
            .rev()
            .map(|name| self.format_value(name))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn format_value(&self, counter: &str) -> String {
        let value = self.values.get(counter).copied().unwrap_or(0);
        if self.appendix && counter == self.top_level() {
            alph(value)
        } else {
            value.to_string()
        }
    }
}

/// Renders 1..=26 as `A`..=`Z`, like `\Alph`; other values stay numeric.
fn alph(value: u32) -> String {
    if (1..=26).contains(&value) {
        char::from_u32(u32::from('A') + value - 1).map_or_else(|| value.to_string(), String::from)
    } else {
        value.to_string()
    }
}
