//! Discourse variables: registration, grouping, and conditional text.
//!
//! A `[DEFINE @a|@b|@c]` sequence declares a group in which exactly one
//! variable may end up true. Later sequences like `[@a>one|@b>two]`
//! render text conditional on those values.

use std::collections::HashMap;

use collapser_foundation::{Error, Result};
use collapser_lexer::{Token, TokenKind, TokenStream};

use crate::config::{ParseParams, Strategy};
use crate::context::ResolutionContext;
use crate::ctrlseq::{self, Alts, Item};
use crate::parse_error_at;

/// Boolean variables partitioned into exclusive groups.
///
/// A variable that was never defined reads as false, the same as one
/// explicitly set false.
#[derive(Clone, Debug, Default)]
pub struct Variables {
    values: HashMap<String, bool>,
    groups: HashMap<String, Vec<String>>,
}

impl Variables {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of a variable, false when undefined.
    #[must_use]
    pub fn check(&self, name: &str) -> bool {
        self.values.get(name).copied().unwrap_or(false)
    }

    /// Returns true when the variable has been defined.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Sets an existing variable. Unknown names are ignored.
    pub fn set(&mut self, name: &str, value: bool) {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
        }
    }

    /// Sets a variable, registering it in `group` if new.
    pub fn set_in_group(&mut self, group: &str, name: &str, value: bool) {
        self.values.insert(name.to_string(), value);
        let members = self.groups.entry(group.to_string()).or_default();
        if !members.iter().any(|m| m == name) {
            members.push(name.to_string());
        }
    }

    /// Sets every registered variable to the given value.
    pub fn set_all(&mut self, value: bool) {
        for slot in self.values.values_mut() {
            *slot = value;
        }
    }

    /// Returns the group a variable belongs to.
    #[must_use]
    pub fn group_of(&self, name: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|(_, members)| members.iter().any(|m| m == name))
            .map(|(group, _)| group.as_str())
    }

    /// Returns the members of a group in declaration order.
    #[must_use]
    pub fn vars_in_group(&self, group: &str) -> Vec<String> {
        self.groups.get(group).cloned().unwrap_or_default()
    }

    /// Returns all group names, sorted.
    #[must_use]
    pub fn group_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.keys().cloned().collect();
        names.sort();
        names
    }

    /// Renders one line per group naming its true member (or `False`).
    /// Two passes with equal signatures made the same choices.
    #[must_use]
    pub fn signature(&self) -> String {
        let mut output = String::new();
        for group in self.group_names() {
            let members = &self.groups[&group];
            match members.iter().find(|m| self.check(m)) {
                Some(member) => output.push_str(&format!("{group}: {member}\n")),
                None => output.push_str(&format!("{group}: False\n")),
            }
        }
        output
    }

    /// Returns the sorted names of all true variables.
    #[must_use]
    pub fn active(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .values
            .iter()
            .filter(|&(_, &v)| v)
            .map(|(k, _)| k.clone())
            .collect();
        names.sort();
        names
    }

    /// Moves the truth within a variable's group to a different member,
    /// chosen at random. Used when a reviewer asks for a regeneration.
    pub fn shuffle_group(&mut self, name: &str, chooser: &mut crate::chooser::Chooser) {
        let Some(group) = self.group_of(name).map(str::to_string) else {
            return;
        };
        let members = self.vars_in_group(&group);
        let current: Vec<String> = members.iter().filter(|m| self.check(m)).cloned().collect();
        let remainders: Vec<String> = members
            .iter()
            .filter(|m| !current.contains(m))
            .cloned()
            .collect();
        let Some(choice) = chooser.one_of(&remainders).cloned() else {
            return;
        };
        for member in &members {
            self.set(member, *member == choice);
        }
    }
}

/// Renders a conditional sequence like `[@a>one|@b>two|neither]`
/// against current variable values.
///
/// # Errors
///
/// Returns an error for undefined variables, variables from different
/// groups, or free text anywhere but the final position.
pub fn render_conditional(
    tokens: &[Token],
    params: &ParseParams,
    vars: &Variables,
    source: &str,
) -> Result<String> {
    let mut seq_group: Option<&str> = None;
    let mut free_text_pos: Option<usize> = None;
    for (pos, token) in tokens.iter().enumerate() {
        match &token.kind {
            TokenKind::Variable(raw) => {
                let name = raw.to_lowercase();
                if !vars.exists(&name) {
                    return Err(parse_error_at(
                        source,
                        format!(
                            "Text conditional on variable '{name}' which has not been defined."
                        ),
                        token.span.start,
                    ));
                }
                let group = vars.group_of(&name);
                if seq_group.is_none() {
                    seq_group = group;
                } else if seq_group != group {
                    return Err(parse_error_at(
                        source,
                        "Found variables from different groups",
                        token.span.start,
                    ));
                }
            }
            TokenKind::Text(_) if pos > 0 => {
                if !matches!(tokens[pos - 1].kind, TokenKind::Variable(_)) {
                    free_text_pos = Some(pos);
                }
            }
            _ => {}
        }
    }
    if let Some(pos) = free_text_pos {
        if pos != tokens.len() - 1 {
            return Err(parse_error_at(
                source,
                format!("Found unexpected variable at pos {pos}"),
                tokens[0].span.start,
            ));
        }
    }

    let mut pos = 0;
    while pos < tokens.len() {
        match &tokens[pos].kind {
            // Bare text at this point is the fallthrough alternative.
            TokenKind::Text(text) => return Ok(text.clone()),
            TokenKind::Divider => {
                pos += 1;
                continue;
            }
            TokenKind::Variable(raw) => {
                let name = raw.to_lowercase();
                pos += 1;
                match tokens.get(pos).map(|t| &t.kind) {
                    Some(TokenKind::Text(text)) => {
                        if params.set_defines.iter().any(|d| d == &name) || vars.check(&name) {
                            return Ok(text.clone());
                        }
                    }
                    Some(TokenKind::Divider) | None => {
                        if params.set_defines.iter().any(|d| d == &name) || vars.check(&name) {
                            return Ok(String::new());
                        }
                    }
                    _ => {}
                }
                pos += 1;
            }
            other => {
                return Err(Error::internal(format!(
                    "unexpected {} in conditional sequence",
                    other.name()
                )));
            }
        }
    }
    Ok(String::new())
}

/// Gathers one candidate per branch of a conditional sequence, each
/// tagged with the variable that would select it.
///
/// # Errors
///
/// Returns an error when a branch names an unregistered variable.
pub fn render_all_variants(tokens: &[Token], vars: &Variables) -> Result<Vec<Item>> {
    let mut items: Vec<Item> = Vec::new();
    let mut group_key: Option<String> = None;
    let mut vars_in_group: Vec<String> = Vec::new();
    let mut pos = 0;
    while pos < tokens.len() {
        match &tokens[pos].kind {
            TokenKind::Text(text) => {
                // The fallthrough branch belongs to whichever group
                // member is still unclaimed.
                let from_var = if vars_in_group.len() == 1 {
                    vars_in_group[0].clone()
                } else {
                    let group = group_key.as_deref().unwrap_or("");
                    vars.vars_in_group(group)
                        .into_iter()
                        .next()
                        .ok_or_else(|| {
                            Error::internal("fallthrough text without a variable group")
                        })?
                };
                items.push(Item::from_var(text.clone(), from_var));
                return Ok(items);
            }
            TokenKind::Divider => {
                pos += 1;
            }
            TokenKind::Variable(raw) => {
                let name = raw.to_lowercase();
                if group_key.is_none() {
                    let group = vars.group_of(&name).ok_or_else(|| {
                        Error::parse(format!("Unrecognized variable found: '{name}'"))
                    })?;
                    vars_in_group = vars.vars_in_group(group);
                    group_key = Some(group.to_string());
                }
                pos += 1;
                match tokens.get(pos).map(|t| &t.kind) {
                    Some(TokenKind::Text(text)) => {
                        items.push(Item::from_var(text.clone(), name.clone()));
                    }
                    Some(TokenKind::Divider) => {
                        let first = vars_in_group.first().ok_or_else(|| {
                            Error::internal("variable group exhausted before its empty branch")
                        })?;
                        items.push(Item::from_var("", first.clone()));
                    }
                    _ => {}
                }
                vars_in_group.retain(|m| m != &name);
                pos += 1;
            }
            other => {
                return Err(Error::internal(format!(
                    "unexpected {} in conditional sequence",
                    other.name()
                )));
            }
        }
    }
    if items.len() == 1 {
        items.push(Item::new(""));
    }
    Ok(items)
}

/// Registers every `[DEFINE ...]` group in the token stream, resolving
/// each group to at most one true member, and returns the tokens with
/// the definitions stripped.
///
/// Resolution order per variable: a forced value from `set_defines`
/// wins; otherwise the author rendition takes the `^` member; otherwise
/// a seeded random draw decides.
///
/// # Errors
///
/// Returns an error for duplicate definitions or probability totals
/// that are neither 0 nor 100.
pub fn handle_defines(
    tokens: &[Token],
    params: &ParseParams,
    ctx: &mut ResolutionContext,
    source: &str,
) -> Result<Vec<Token>> {
    let mut output = Vec::new();
    let mut index = 0;
    let mut last_var_name = String::new();
    ctx.chooser.reset_iter("groups");
    let params = params.normalized();

    while index < tokens.len() {
        if !matches!(tokens[index].kind, TokenKind::CtrlBegin) {
            output.push(tokens[index].clone());
            index += 1;
            continue;
        }
        if !matches!(
            tokens.get(index + 1).map(|t| &t.kind),
            Some(TokenKind::Define)
        ) {
            output.push(tokens[index].clone());
            if let Some(token) = tokens.get(index + 1) {
                output.push(token.clone());
            }
            index += 2;
            continue;
        }
        index += 2;

        let mut alts = Alts::new();
        let mut prob_total: u32 = 0;
        let mut found_set_define = false;
        let mut found_author_preferred = false;
        let group_name = format!("group{}", ctx.chooser.iter("groups"));

        while index < tokens.len() && !matches!(tokens[index].kind, TokenKind::CtrlEnd) {
            let start = index;
            while index < tokens.len()
                && !matches!(tokens[index].kind, TokenKind::Divider | TokenKind::CtrlEnd)
            {
                index += 1;
            }
            let item = ctrlseq::parse_item(&tokens[start..index], true, source)?;
            let var_span = tokens[index - 1].span;
            let varname = item.text.clone();
            last_var_name = varname.clone();

            if ctx.variables.exists(&varname) {
                return Err(parse_error_at(
                    source,
                    format!("Variable '@{varname}' is defined twice."),
                    var_span.start,
                ));
            }
            if params.set_defines.iter().any(|d| d == &varname) {
                ctx.variables.set_in_group(&group_name, &varname, true);
                found_set_define = true;
            } else if params
                .set_defines
                .iter()
                .any(|d| d == &format!("^{varname}"))
            {
                ctx.variables.set_in_group(&group_name, &varname, false);
                found_set_define = true;
            } else {
                if item.author_preferred {
                    found_author_preferred = true;
                    alts.set_author_preferred();
                }
                if let Some(prob) = item.prob {
                    prob_total += u32::from(prob);
                }
                alts.add(Item::with_prob(varname.clone(), item.prob));
                ctx.variables.set_in_group(&group_name, &varname, false);
            }

            if index < tokens.len() && matches!(tokens[index].kind, TokenKind::Divider) {
                index += 1;
            }
        }

        if !found_set_define {
            if alts.len() > 1 && prob_total != 0 && prob_total != 100 {
                let span = tokens[index.saturating_sub(1)].span;
                return Err(parse_error_at(
                    source,
                    format!(
                        "Probabilities in a DEFINE must sum to 100: found {prob_total} instead in '{alts}'"
                    ),
                    span.start,
                ));
            }
            if alts.is_empty() {
                ctx.variables
                    .set_in_group(&group_name, &last_var_name, false);
            } else if params.strategy == Strategy::Author
                && alts.len() == 1
                && !found_author_preferred
            {
                let picked = alts.author_preferred().to_string();
                ctx.variables.set_in_group(&group_name, &picked, false);
            } else if params.strategy == Strategy::Author {
                let picked = alts.author_preferred().to_string();
                ctx.variables.set_in_group(&group_name, &picked, true);
            } else if alts.len() == 1 {
                let picked = alts.random_text(&mut ctx.chooser);
                let value = ctx.chooser.percent(50);
                ctx.variables.set_in_group(&group_name, &picked, value);
            } else {
                let picked = alts.random_text(&mut ctx.chooser);
                ctx.variables.set_in_group(&group_name, &picked, true);
            }
        }

        // Skip the closing bracket.
        index += 1;
    }
    Ok(output)
}

/// Removes every `[DEFINE ...]` sequence from the token stream.
///
/// # Errors
///
/// Returns an error when the stream contains a stray top-level token.
pub fn strip_defines(tokens: &[Token]) -> Result<Vec<Token>> {
    let mut output = Vec::new();
    let mut stream = TokenStream::new(tokens);
    while let Some(chunk) = stream.next_chunk()? {
        if stream.was_text() || !matches!(chunk.get(1).map(|t| &t.kind), Some(TokenKind::Define)) {
            output.extend_from_slice(chunk);
        }
    }
    Ok(output)
}
