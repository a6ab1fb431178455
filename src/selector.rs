use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectorAttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
    StartsWith { key: String, value: String },
    EndsWith { key: String, value: String },
    Contains { key: String, value: String },
    Includes { key: String, value: String },
    DashMatch { key: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SelectorStep {
    pub(crate) tag: Option<String>,
    pub(crate) universal: bool,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<SelectorAttrCondition>,
}

impl SelectorStep {
    pub(crate) fn id_only(&self) -> Option<&str> {
        if !self.universal && self.tag.is_none() && self.classes.is_empty() && self.attrs.is_empty()
        {
            self.id.as_deref()
        } else {
            None
        }
    }

    fn is_empty(&self) -> bool {
        !self.universal
            && self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SelectorCombinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorPart {
    pub(crate) step: SelectorStep,
    // Relation to previous (left) selector part.
    pub(crate) combinator: Option<SelectorCombinator>,
}

/// Escapes `ident` so it can be embedded in a selector, following CSSOM `CSS.escape`.
pub fn css_escape(ident: &str) -> String {
    let chars = ident.chars().collect::<Vec<_>>();
    let mut out = String::with_capacity(ident.len());
    for (index, ch) in chars.iter().copied().enumerate() {
        let code = ch as u32;
        if code == 0 {
            out.push('\u{FFFD}');
            continue;
        }
        let leading_digit = ch.is_ascii_digit()
            && (index == 0 || (index == 1 && chars[0] == '-'));
        if (0x01..=0x1F).contains(&code) || code == 0x7F || leading_digit {
            out.push_str(&format!("\\{code:x} "));
            continue;
        }
        if index == 0 && ch == '-' && chars.len() == 1 {
            out.push_str("\\-");
            continue;
        }
        if code >= 0x80 || ch == '-' || ch == '_' || ch.is_ascii_alphanumeric() {
            out.push(ch);
            continue;
        }
        out.push('\\');
        out.push(ch);
    }
    out
}

pub(crate) fn parse_selector_list(selector: &str) -> Result<Vec<Vec<SelectorPart>>> {
    let mut cursor = SelectorCursor::new(selector);
    let mut groups = Vec::new();
    loop {
        let chain = cursor.parse_complex(selector)?;
        groups.push(chain);
        cursor.skip_ws();
        if cursor.eat(',') {
            continue;
        }
        if cursor.at_end() {
            break;
        }
        return Err(Error::UnsupportedSelector(selector.into()));
    }
    Ok(groups)
}

struct SelectorCursor {
    chars: Vec<char>,
    pos: usize,
}

impl SelectorCursor {
    fn new(src: &str) -> Self {
        Self {
            chars: src.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn parse_complex(&mut self, selector: &str) -> Result<Vec<SelectorPart>> {
        let mut parts: Vec<SelectorPart> = Vec::new();
        self.skip_ws();
        loop {
            let saw_ws = self.skip_ws();
            match self.peek() {
                None | Some(',') => break,
                _ => {}
            }

            let combinator = if self.eat('>') {
                self.skip_ws();
                if parts.is_empty() {
                    return Err(Error::UnsupportedSelector(selector.into()));
                }
                Some(SelectorCombinator::Child)
            } else if parts.is_empty() {
                None
            } else if saw_ws {
                Some(SelectorCombinator::Descendant)
            } else {
                return Err(Error::UnsupportedSelector(selector.into()));
            };

            let step = self.parse_compound(selector)?;
            parts.push(SelectorPart { step, combinator });
        }

        if parts.is_empty() {
            return Err(Error::UnsupportedSelector(selector.into()));
        }
        Ok(parts)
    }

    fn parse_compound(&mut self, selector: &str) -> Result<SelectorStep> {
        let mut step = SelectorStep::default();
        loop {
            match self.peek() {
                Some('*') => {
                    self.pos += 1;
                    step.universal = true;
                }
                Some('#') => {
                    self.pos += 1;
                    step.id = Some(self.parse_ident(selector)?);
                }
                Some('.') => {
                    self.pos += 1;
                    step.classes.push(self.parse_ident(selector)?);
                }
                Some('[') => {
                    self.pos += 1;
                    step.attrs.push(self.parse_attr(selector)?);
                }
                Some(ch) if step.is_empty() && self.starts_ident(ch) => {
                    step.tag = Some(self.parse_ident(selector)?.to_ascii_lowercase());
                }
                _ => break,
            }
        }
        if step.is_empty() {
            return Err(Error::UnsupportedSelector(selector.into()));
        }
        Ok(step)
    }

    fn starts_ident(&self, ch: char) -> bool {
        is_ident_char(ch) || ch == '\\'
    }

    fn parse_ident(&mut self, selector: &str) -> Result<String> {
        let mut out = String::new();
        while let Some(ch) = self.peek() {
            if ch == '\\' {
                self.pos += 1;
                out.push(self.parse_escape(selector)?);
            } else if is_ident_char(ch) {
                out.push(ch);
                self.pos += 1;
            } else {
                break;
            }
        }
        if out.is_empty() {
            return Err(Error::UnsupportedSelector(selector.into()));
        }
        Ok(out)
    }

    fn parse_escape(&mut self, selector: &str) -> Result<char> {
        let Some(first) = self.peek() else {
            return Err(Error::UnsupportedSelector(selector.into()));
        };
        if !first.is_ascii_hexdigit() {
            self.pos += 1;
            return Ok(first);
        }

        let mut hex = String::new();
        while hex.len() < 6 && self.peek().is_some_and(|ch| ch.is_ascii_hexdigit()) {
            hex.push(self.peek().unwrap_or_default());
            self.pos += 1;
        }
        // A single whitespace terminates a hex escape and is consumed with it.
        if self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        let code = u32::from_str_radix(&hex, 16)
            .map_err(|_| Error::UnsupportedSelector(selector.into()))?;
        if code == 0 {
            return Ok('\u{FFFD}');
        }
        Ok(char::from_u32(code).unwrap_or('\u{FFFD}'))
    }

    fn parse_attr(&mut self, selector: &str) -> Result<SelectorAttrCondition> {
        self.skip_ws();
        let key = self.parse_ident(selector)?.to_ascii_lowercase();
        self.skip_ws();
        if self.eat(']') {
            return Ok(SelectorAttrCondition::Exists { key });
        }

        let op = match (self.peek(), self.peek_at(1)) {
            (Some('='), _) => {
                self.pos += 1;
                '='
            }
            (Some(op @ ('^' | '$' | '*' | '~' | '|')), Some('=')) => {
                self.pos += 2;
                op
            }
            _ => return Err(Error::UnsupportedSelector(selector.into())),
        };

        self.skip_ws();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let mut value = String::new();
                loop {
                    match self.peek() {
                        None => return Err(Error::UnsupportedSelector(selector.into())),
                        Some(ch) if ch == quote => {
                            self.pos += 1;
                            break;
                        }
                        Some('\\') => {
                            self.pos += 1;
                            value.push(self.parse_escape(selector)?);
                        }
                        Some(ch) => {
                            value.push(ch);
                            self.pos += 1;
                        }
                    }
                }
                value
            }
            _ => self.parse_ident(selector)?,
        };
        self.skip_ws();
        if !self.eat(']') {
            return Err(Error::UnsupportedSelector(selector.into()));
        }

        Ok(match op {
            '=' => SelectorAttrCondition::Eq { key, value },
            '^' => SelectorAttrCondition::StartsWith { key, value },
            '$' => SelectorAttrCondition::EndsWith { key, value },
            '*' => SelectorAttrCondition::Contains { key, value },
            '~' => SelectorAttrCondition::Includes { key, value },
            _ => SelectorAttrCondition::DashMatch { key, value },
        })
    }
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || (ch as u32) >= 0x80
}

impl Dom {
    pub(crate) fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        let groups = parse_selector_list(selector)?;
        if let [chain] = groups.as_slice() {
            if let [part] = chain.as_slice() {
                if let Some(id) = part.step.id_only() {
                    return Ok(self.by_id(id));
                }
            }
        }
        Ok(self
            .all_element_nodes()
            .into_iter()
            .find(|node| groups.iter().any(|chain| self.matches_chain(*node, chain))))
    }

    pub(crate) fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let groups = parse_selector_list(selector)?;
        Ok(self
            .all_element_nodes()
            .into_iter()
            .filter(|node| groups.iter().any(|chain| self.matches_chain(*node, chain)))
            .collect())
    }

    fn matches_chain(&self, node_id: NodeId, parts: &[SelectorPart]) -> bool {
        let Some((last, rest)) = parts.split_last() else {
            return false;
        };
        if !self.matches_step(node_id, &last.step) {
            return false;
        }
        if rest.is_empty() {
            return true;
        }
        match last.combinator {
            Some(SelectorCombinator::Child) => self
                .parent(node_id)
                .is_some_and(|parent| self.matches_chain(parent, rest)),
            Some(SelectorCombinator::Descendant) => {
                let mut cursor = self.parent(node_id);
                while let Some(ancestor) = cursor {
                    if self.matches_chain(ancestor, rest) {
                        return true;
                    }
                    cursor = self.parent(ancestor);
                }
                false
            }
            None => false,
        }
    }

    fn matches_step(&self, node_id: NodeId, step: &SelectorStep) -> bool {
        let Some(element) = self.element(node_id) else {
            return false;
        };
        if let Some(tag) = &step.tag {
            if !element.tag_name.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &step.id {
            if element.attrs.get("id") != Some(id) {
                return false;
            }
        }
        if !step.classes.is_empty() {
            let classes = self.class_list(node_id);
            if !step
                .classes
                .iter()
                .all(|class_name| classes.contains(class_name))
            {
                return false;
            }
        }
        step.attrs.iter().all(|cond| match cond {
            SelectorAttrCondition::Exists { key } => element.attrs.contains_key(key),
            SelectorAttrCondition::Eq { key, value } => element.attrs.get(key) == Some(value),
            SelectorAttrCondition::StartsWith { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|attr| !value.is_empty() && attr.starts_with(value.as_str())),
            SelectorAttrCondition::EndsWith { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|attr| !value.is_empty() && attr.ends_with(value.as_str())),
            SelectorAttrCondition::Contains { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|attr| !value.is_empty() && attr.contains(value.as_str())),
            SelectorAttrCondition::Includes { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|attr| attr.split_whitespace().any(|token| token == value)),
            SelectorAttrCondition::DashMatch { key, value } => {
                element.attrs.get(key).is_some_and(|attr| {
                    attr == value
                        || attr
                            .strip_prefix(value.as_str())
                            .is_some_and(|rest| rest.starts_with('-'))
                })
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;

    #[test]
    fn css_escape_handles_special_characters() {
        assert_eq!(css_escape("about"), "about");
        assert_eq!(css_escape("a.b"), "a\\.b");
        assert_eq!(css_escape("1st"), "\\31 st");
        assert_eq!(css_escape("-2x"), "-\\32 x");
        assert_eq!(css_escape("-"), "\\-");
        assert_eq!(css_escape("x:y z"), "x\\:y\\ z");
        assert_eq!(css_escape("caf\u{e9}"), "caf\u{e9}");
    }

    #[test]
    fn escaped_ids_resolve_through_query_selector() -> Result<()> {
        let dom = parse_html("<div id='a.b'></div><div id='1st'></div><div id='x:y z'></div>")?;
        for id in ["a.b", "1st", "x:y z"] {
            let selector = format!("#{}", css_escape(id));
            let found = dom.query_selector(&selector)?;
            assert_eq!(found, dom.by_id(id), "selector {selector}");
            assert!(found.is_some());
        }
        Ok(())
    }

    #[test]
    fn descendant_and_attribute_prefix_selectors_match() -> Result<()> {
        let dom = parse_html(
            r##"<main>
                 <section id="home"></section>
                 <div><section id="about"></section></div>
                 <section></section>
               </main>
               <section id="outside"></section>
               <a id="l1" href="#home">Home</a><a id="l2" href="/x">X</a>"##,
        )?;
        let sections = dom.query_selector_all("main section[id]")?;
        let ids = sections
            .iter()
            .filter_map(|node| dom.attr(*node, "id"))
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["home", "about"]);

        let anchors = dom.query_selector_all(r##"a[href^="#"]"##)?;
        assert_eq!(anchors, dom.by_id("l1").into_iter().collect::<Vec<_>>());

        let direct = dom.query_selector_all("main > section")?;
        assert_eq!(direct.len(), 2);
        Ok(())
    }

    #[test]
    fn malformed_selectors_are_rejected() {
        for selector in ["", "  ", "> a", "a >", "[href", "#", "a,,b"] {
            assert!(
                matches!(
                    parse_selector_list(selector),
                    Err(Error::UnsupportedSelector(_))
                ),
                "selector {selector:?} should be rejected"
            );
        }
    }
}
