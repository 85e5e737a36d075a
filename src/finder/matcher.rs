//! Name matching: does a file or directory name belong to the target app?
//!
//! Checks run in a fixed order and the first hit wins:
//!
//! 1. the full bundle identifier appears anywhere in the name
//! 2. the bundle identifier minus a trailing version number appears
//!    (`com.vendor.app2` also finds `com.vendor.app.plist`)
//! 3. `<name>.app` bundles match on an exact name or a name prefix that
//!    ends on a token boundary (`Notes 2.app`, never `NotesHelper.app`)
//! 4. a token of the name equals the app name, or, where the
//!    [`TokenRunPolicy`] allows it, the tokenized app name appears as a
//!    contiguous run of tokens (`Microsoft Excel` inside
//!    `com.microsoft.package.Microsoft_Excel.app`)

use serde::{Deserialize, Serialize};

/// Characters that separate tokens in file names
const DELIMITERS: &[char] = &['.', '-', '_', ' ', '/'];

/// Where the multi-token run search is allowed to fire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenRunPolicy {
    /// Only token equality, never run search
    Never,
    /// Run search only in receipt-style directories full of sibling packages
    #[default]
    ReceiptsOnly,
    /// Run search in every root
    Everywhere,
}

/// The kind of directory a candidate was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchScope {
    Standard,
    Receipts,
}

/// Split a name on `. - _ space /`, dropping empty tokens
pub fn tokenize(name: &str) -> Vec<&str> {
    name.split(DELIMITERS).filter(|t| !t.is_empty()).collect()
}

/// Second label of a bundle identifier (`com.vendor.app` -> `vendor`)
pub fn domain_hint(bundle_id: &str) -> &str {
    bundle_id.split('.').nth(1).unwrap_or("")
}

/// Token pattern with its KMP failure table.
///
/// `failure[i]` is the length of the longest proper prefix of
/// `tokens[..=i]` that is also a suffix of it.
#[derive(Debug, Clone)]
pub struct TokenPattern {
    tokens: Vec<String>,
    failure: Vec<usize>,
}

impl TokenPattern {
    pub fn new(name: &str) -> Self {
        let tokens: Vec<String> = tokenize(name).into_iter().map(str::to_string).collect();
        let failure = failure_table(&tokens);
        Self { tokens, failure }
    }

    pub fn failure(&self) -> &[usize] {
        &self.failure
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Linear-time search for the pattern as a contiguous run inside `haystack`
    pub fn find_in<S: AsRef<str>>(&self, haystack: &[S]) -> Option<usize> {
        if self.tokens.is_empty() || haystack.len() < self.tokens.len() {
            return None;
        }

        let mut matched = 0;
        for (i, token) in haystack.iter().enumerate() {
            let token = token.as_ref();
            while matched > 0 && self.tokens[matched] != token {
                matched = self.failure[matched - 1];
            }
            if self.tokens[matched] == token {
                matched += 1;
            }
            if matched == self.tokens.len() {
                return Some(i + 1 - matched);
            }
        }
        None
    }
}

fn failure_table(tokens: &[String]) -> Vec<usize> {
    let mut failure = vec![0; tokens.len()];
    let mut k = 0;
    for i in 1..tokens.len() {
        while k > 0 && tokens[i] != tokens[k] {
            k = failure[k - 1];
        }
        if tokens[i] == tokens[k] {
            k += 1;
        }
        failure[i] = k;
    }
    failure
}

/// Precomputed matcher for one scan target.
///
/// Built once per scan and shared read-only by every traversal thread.
#[derive(Debug, Clone)]
pub struct Matcher {
    app_name: String,
    bundle_id: String,
    bundle_base: Option<String>,
    pattern: TokenPattern,
    policy: TokenRunPolicy,
}

impl Matcher {
    pub fn new(app_name: &str, bundle_id: &str, policy: TokenRunPolicy) -> Self {
        let app_name = app_name.trim().to_lowercase();
        let app_name = app_name
            .strip_suffix(".app")
            .map(str::to_string)
            .unwrap_or(app_name);
        let bundle_id = bundle_id.trim().to_lowercase();

        let trimmed = bundle_id.trim_end_matches(|c: char| c.is_ascii_digit());
        let bundle_base = (trimmed != bundle_id && !trimmed.is_empty() && !trimmed.ends_with('.'))
            .then(|| trimmed.to_string());

        let pattern = TokenPattern::new(&app_name);

        Self {
            app_name,
            bundle_id,
            bundle_base,
            pattern,
            policy,
        }
    }

    pub fn bundle_id(&self) -> &str {
        &self.bundle_id
    }

    /// Test a single file or directory name found in a root of kind `scope`
    pub fn is_match(&self, candidate: &str, scope: MatchScope) -> bool {
        if self.app_name.is_empty() && self.bundle_id.is_empty() {
            return false;
        }
        let name = candidate.to_lowercase();

        if !self.bundle_id.is_empty() && name.contains(&self.bundle_id) {
            return true;
        }

        if let Some(base) = &self.bundle_base {
            if name.contains(base.as_str()) {
                return true;
            }
        }

        let stem = match name.strip_suffix(".app") {
            Some(base) => {
                if self.matches_bundle_name(base) {
                    return true;
                }
                base
            }
            None => name.as_str(),
        };

        if self.app_name.is_empty() {
            return false;
        }

        let tokens = tokenize(stem);
        if tokens.iter().any(|t| *t == self.app_name) {
            return true;
        }

        if self.runs_allowed(scope) && self.pattern.len() > 1 {
            return self.pattern.find_in(trim_numeric_tail(&tokens)).is_some();
        }

        false
    }

    fn runs_allowed(&self, scope: MatchScope) -> bool {
        match self.policy {
            TokenRunPolicy::Never => false,
            TokenRunPolicy::ReceiptsOnly => scope == MatchScope::Receipts,
            TokenRunPolicy::Everywhere => true,
        }
    }

    /// Exact or boundary-respecting prefix match on a stripped `.app` name
    fn matches_bundle_name(&self, base: &str) -> bool {
        if self.app_name.is_empty() {
            return false;
        }
        match base.strip_prefix(self.app_name.as_str()) {
            Some("") => true,
            Some(rest) => rest.starts_with(|c: char| DELIMITERS.contains(&c) || c.is_ascii_digit()),
            None => false,
        }
    }
}

/// Drop trailing purely numeric tokens (`excel 16 0` -> `excel`)
fn trim_numeric_tail<'a, 'b>(tokens: &'b [&'a str]) -> &'b [&'a str] {
    let keep = tokens
        .iter()
        .rposition(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .map_or(0, |i| i + 1);
    &tokens[..keep]
}

/// Pure form of the matcher for one-off checks, without token runs
pub fn is_match(candidate: &str, app_name: &str, bundle_id: &str) -> bool {
    Matcher::new(app_name, bundle_id, TokenRunPolicy::Never).is_match(candidate, MatchScope::Standard)
}
