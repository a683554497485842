use crate::dom::{Dom, NodeId};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectorAttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
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
    fn id_only(&self) -> Option<&str> {
        if !self.universal && self.tag.is_none() && self.classes.is_empty() && self.attrs.is_empty()
        {
            self.id.as_deref()
        } else {
            None
        }
    }

    fn matches(&self, dom: &Dom, node: NodeId) -> bool {
        let Some(element) = dom.element(node) else {
            return false;
        };

        if let Some(tag) = &self.tag {
            if !element.tag_name.eq_ignore_ascii_case(tag) {
                return false;
            }
        }

        if let Some(id) = &self.id {
            if element.attrs.get("id") != Some(id) {
                return false;
            }
        }

        for class in &self.classes {
            let has_class = element
                .attrs
                .get("class")
                .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class));
            if !has_class {
                return false;
            }
        }

        for condition in &self.attrs {
            let ok = match condition {
                SelectorAttrCondition::Exists { key } => element.attrs.contains_key(key),
                SelectorAttrCondition::Eq { key, value } => {
                    element.attrs.get(key) == Some(value)
                }
            };
            if !ok {
                return false;
            }
        }

        true
    }
}

/// One comma-alternative: descendant-combined steps, outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorPath {
    pub(crate) steps: Vec<SelectorStep>,
}

impl SelectorPath {
    fn matches(&self, dom: &Dom, node: NodeId) -> bool {
        let Some(last) = self.steps.last() else {
            return false;
        };
        if !last.matches(dom, node) {
            return false;
        }

        // Remaining steps must match some chain of ancestors.
        let mut step_idx = self.steps.len().wrapping_sub(2);
        let mut cursor = dom.parent(node);
        while step_idx != usize::MAX {
            let step = &self.steps[step_idx];
            let mut found = None;
            while let Some(ancestor) = cursor {
                if step.matches(dom, ancestor) {
                    found = Some(ancestor);
                    break;
                }
                cursor = dom.parent(ancestor);
            }
            match found {
                Some(ancestor) => {
                    cursor = dom.parent(ancestor);
                    step_idx = step_idx.wrapping_sub(1);
                }
                None => return false,
            }
        }
        true
    }
}

pub(crate) fn parse_selector_list(selector: &str) -> Result<Vec<SelectorPath>> {
    let mut paths = Vec::new();
    for alternative in selector.split(',') {
        let alternative = alternative.trim();
        if alternative.is_empty() {
            return Err(Error::UnsupportedSelector(selector.to_string()));
        }
        let mut steps = Vec::new();
        for part in alternative.split_ascii_whitespace() {
            steps.push(parse_step(selector, part)?);
        }
        if steps.is_empty() {
            return Err(Error::UnsupportedSelector(selector.to_string()));
        }
        paths.push(SelectorPath { steps });
    }
    Ok(paths)
}

fn parse_step(full: &str, part: &str) -> Result<SelectorStep> {
    let mut step = SelectorStep::default();
    let chars = part.chars().collect::<Vec<_>>();
    let mut i = 0usize;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                step.universal = true;
                i += 1;
            }
            '#' => {
                let (name, next) = read_name(&chars, i + 1);
                if name.is_empty() {
                    return Err(Error::UnsupportedSelector(full.to_string()));
                }
                step.id = Some(name);
                i = next;
            }
            '.' => {
                let (name, next) = read_name(&chars, i + 1);
                if name.is_empty() {
                    return Err(Error::UnsupportedSelector(full.to_string()));
                }
                step.classes.push(name);
                i = next;
            }
            '[' => {
                let close = chars[i..]
                    .iter()
                    .position(|&c| c == ']')
                    .map(|offset| i + offset)
                    .ok_or_else(|| Error::UnsupportedSelector(full.to_string()))?;
                let body = chars[i + 1..close].iter().collect::<String>();
                step.attrs.push(parse_attr_condition(full, &body)?);
                i = close + 1;
            }
            ch if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' => {
                let (name, next) = read_name(&chars, i);
                step.tag = Some(name.to_ascii_lowercase());
                i = next;
            }
            _ => return Err(Error::UnsupportedSelector(full.to_string())),
        }
    }

    if step == SelectorStep::default() {
        return Err(Error::UnsupportedSelector(full.to_string()));
    }
    Ok(step)
}

fn read_name(chars: &[char], from: usize) -> (String, usize) {
    let mut i = from;
    let mut out = String::new();
    while i < chars.len() {
        let ch = chars[i];
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            out.push(ch);
            i += 1;
        } else {
            break;
        }
    }
    (out, i)
}

fn parse_attr_condition(full: &str, body: &str) -> Result<SelectorAttrCondition> {
    let body = body.trim();
    if body.is_empty() {
        return Err(Error::UnsupportedSelector(full.to_string()));
    }
    let Some((key, value)) = body.split_once('=') else {
        return Ok(SelectorAttrCondition::Exists {
            key: body.to_ascii_lowercase(),
        });
    };
    let key = key.trim().to_ascii_lowercase();
    let value = value.trim();
    let value = value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
        .unwrap_or(value);
    if key.is_empty() {
        return Err(Error::UnsupportedSelector(full.to_string()));
    }
    Ok(SelectorAttrCondition::Eq {
        key,
        value: value.to_string(),
    })
}

/// `querySelector` semantics: first match in document order, across
/// all comma alternatives. `#id`-only selectors hit the arena index.
pub(crate) fn select_one(dom: &Dom, selector: &str) -> Result<NodeId> {
    let paths = parse_selector_list(selector)?;

    if let [path] = paths.as_slice() {
        if let [step] = path.steps.as_slice() {
            if let Some(id) = step.id_only() {
                return dom
                    .by_id(id)
                    .ok_or_else(|| Error::SelectorNotFound(selector.to_string()));
            }
        }
    }

    dom.elements_in_order()
        .into_iter()
        .find(|node| paths.iter().any(|path| path.matches(dom, *node)))
        .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
}

pub(crate) fn select_all(dom: &Dom, selector: &str) -> Result<Vec<NodeId>> {
    let paths = parse_selector_list(selector)?;
    Ok(dom
        .elements_in_order()
        .into_iter()
        .filter(|node| paths.iter().any(|path| path.matches(dom, *node)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;

    const PAGE: &str = r#"
        <div id='main-content' class='panel wide'>
          <form id='drink-form' action='/add_drink' method='post'>
            <input id='selected-drink' name='drink' value=''>
            <button class='drink-button' type='submit'>Bier</button>
          </form>
        </div>
        <div id='custom-drink' style='display: none;'>
          <input name='custom-drink-name'>
        </div>
        "#;

    #[test]
    fn id_selector_uses_index() -> Result<()> {
        let dom = parse_html(PAGE)?;
        let node = select_one(&dom, "#drink-form")?;
        assert_eq!(dom.tag_name(node), Some("form"));
        Ok(())
    }

    #[test]
    fn first_input_in_document_order() -> Result<()> {
        let dom = parse_html(PAGE)?;
        let node = select_one(&dom, "input")?;
        assert_eq!(dom.attr(node, "id").as_deref(), Some("selected-drink"));
        Ok(())
    }

    #[test]
    fn descendant_and_class_steps_combine() -> Result<()> {
        let dom = parse_html(PAGE)?;
        let node = select_one(&dom, "form .drink-button")?;
        assert_eq!(dom.tag_name(node), Some("button"));
        assert!(select_one(&dom, "#custom-drink .drink-button").is_err());
        Ok(())
    }

    #[test]
    fn attribute_condition_matches_exact_value() -> Result<()> {
        let dom = parse_html(PAGE)?;
        let node = select_one(&dom, "input[name='custom-drink-name']")?;
        let custom = select_one(&dom, "#custom-drink")?;
        assert_eq!(dom.parent(node), Some(custom));
        Ok(())
    }

    #[test]
    fn comma_list_matches_either_alternative() -> Result<()> {
        let dom = parse_html(PAGE)?;
        let all = select_all(&dom, "#selected-drink, .drink-button")?;
        assert_eq!(all.len(), 2);
        Ok(())
    }

    #[test]
    fn missing_and_malformed_selectors_report_distinct_errors() -> Result<()> {
        let dom = parse_html(PAGE)?;
        assert_eq!(
            select_one(&dom, "#reset-form"),
            Err(Error::SelectorNotFound("#reset-form".to_string()))
        );
        assert_eq!(
            select_one(&dom, "input:checked"),
            Err(Error::UnsupportedSelector("input:checked".to_string()))
        );
        Ok(())
    }
}
