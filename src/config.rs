/// Settings consumed by parsing, assembly and marshaling.
///
/// Every entry point that needs one of these takes a `&Config`; the
/// `Default` value reproduces the stock output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    banner: BannerTemplate,
    blank_lines: usize,
    group_threshold: usize,
    omit_comments: bool,
    omit_commented: bool,
    omit_shadows: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            banner: BannerTemplate::default(),
            blank_lines: 1,
            group_threshold: 0,
            omit_comments: false,
            omit_commented: false,
            omit_shadows: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Template used to render and recognize block banner comments.
    pub fn banner(mut self, banner: BannerTemplate) -> Self {
        self.banner = banner;
        self
    }

    /// Number of blank lines emitted between top-level items.
    pub fn blank_lines(mut self, blank_lines: usize) -> Self {
        self.blank_lines = blank_lines;
        self
    }

    /// A prefix group becomes a block once it holds more rows than this.
    pub fn group_threshold(mut self, group_threshold: usize) -> Self {
        self.group_threshold = group_threshold;
        self
    }

    /// Drop row comments and block banners from marshaled output.
    pub fn omit_comments(mut self, omit_comments: bool) -> Self {
        self.omit_comments = omit_comments;
        self
    }

    /// Drop commented-out rows from marshaled output.
    pub fn omit_commented(mut self, omit_commented: bool) -> Self {
        self.omit_commented = omit_commented;
        self
    }

    /// Drop shadow lines from marshaled output.
    pub fn omit_shadows(mut self, omit_shadows: bool) -> Self {
        self.omit_shadows = omit_shadows;
        self
    }

    pub fn banner_template(&self) -> &BannerTemplate {
        &self.banner
    }

    pub fn blank_line_count(&self) -> usize {
        self.blank_lines
    }

    pub fn threshold(&self) -> usize {
        self.group_threshold
    }

    pub fn omits_comments(&self) -> bool {
        self.omit_comments
    }

    pub fn omits_commented(&self) -> bool {
        self.omit_commented
    }

    pub fn omits_shadows(&self) -> bool {
        self.omit_shadows
    }
}

/// The `(before, after)` pair wrapped around a block banner comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerTemplate {
    before: String,
    after: String,
}

impl Default for BannerTemplate {
    fn default() -> Self {
        Self::new("###   ---[ ", " ]---   ###")
    }
}

impl BannerTemplate {
    pub fn new(before: impl Into<String>, after: impl Into<String>) -> Self {
        Self {
            before: before.into(),
            after: after.into(),
        }
    }

    pub fn before(&self) -> &str {
        &self.before
    }

    pub fn after(&self) -> &str {
        &self.after
    }

    pub fn render(&self, text: &str) -> String {
        format!("{}{}{}", self.before, text, self.after)
    }

    /// Return the banner text if `line` is wrapped in this template.
    ///
    /// Both halves are compared with surrounding whitespace trimmed, so a
    /// banner survives editors that strip trailing spaces.
    pub fn matches(&self, line: &str) -> Option<String> {
        let line = line.trim();
        let before = self.before.trim();
        let after = self.after.trim();
        if line.len() < before.len() + after.len() {
            return None;
        }

        let inner = line.strip_prefix(before)?.strip_suffix(after)?;
        Some(inner.trim().to_owned())
    }
}
