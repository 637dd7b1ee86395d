//! Interaction executor: clicks, fills, synthetic events, evaluation.
//!
//! Every locating operation resolves the first match in document order at
//! the moment it runs. Zero matches fail fast with `ElementNotFound`;
//! callers that cannot guarantee existence wait first.

use serde_json::Value;
use tracing::debug;

use crate::driver::js_string;
use crate::error::HarnessError;
use crate::session::Session;

fn dispatch_script(selector: &str, event_name: &str) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) return false;
            el.dispatchEvent(new Event({event}, {{ bubbles: true, cancelable: true }}));
            return true;
        }})()"#,
        sel = js_string(selector),
        event = js_string(event_name)
    )
}

fn click_text_script(text: &str) -> String {
    format!(
        r#"(() => {{
            const needle = {text};
            const walker = document.createTreeWalker(document.body, NodeFilter.SHOW_ELEMENT);
            while (walker.nextNode()) {{
                const el = walker.currentNode;
                if (el.children.length === 0 && el.textContent.trim() === needle) {{
                    el.scrollIntoView({{ block: 'center' }});
                    el.click();
                    return true;
                }}
            }}
            return false;
        }})()"#,
        text = js_string(text)
    )
}

impl Session {
    /// Fail with `ElementNotFound` unless at least one element matches.
    async fn require_match(&self, selector: &str) -> Result<(), HarnessError> {
        if self.driver()?.query_count(selector).await? == 0 {
            return Err(HarnessError::ElementNotFound {
                selector: selector.to_string(),
            });
        }
        Ok(())
    }

    /// Click the first element matching `selector` via input emulation.
    pub async fn click(&self, selector: &str) -> Result<(), HarnessError> {
        self.require_match(selector).await?;
        debug!(target: "uiprobe::interact", selector, "click");
        self.driver()?.click(selector).await
    }

    /// Click the first leaf element whose trimmed text equals `text`.
    /// Used where the target has no stable selector, only a label.
    pub async fn click_text(&self, text: &str) -> Result<(), HarnessError> {
        debug!(target: "uiprobe::interact", text, "click by text");
        let clicked = self.driver()?.evaluate(&click_text_script(text)).await?;
        if clicked.as_bool().unwrap_or(false) {
            Ok(())
        } else {
            Err(HarnessError::ElementNotFound {
                selector: format!("text={text}"),
            })
        }
    }

    /// Replace the value of the first element matching `selector`.
    pub async fn fill(&self, selector: &str, text: &str) -> Result<(), HarnessError> {
        self.require_match(selector).await?;
        debug!(target: "uiprobe::interact", selector, "fill");
        self.driver()?.fill(selector, text).await
    }

    /// Construct and dispatch a synthetic DOM event on the first match.
    /// Covers events pointer emulation cannot produce, e.g. `dragenter`.
    pub async fn dispatch_event(
        &self,
        selector: &str,
        event_name: &str,
    ) -> Result<(), HarnessError> {
        self.require_match(selector).await?;
        debug!(target: "uiprobe::interact", selector, event = event_name, "dispatch event");
        let dispatched = self
            .driver()?
            .evaluate(&dispatch_script(selector, event_name))
            .await?;
        // The element can vanish between the match check and the dispatch;
        // the script reports whether it still found one.
        if !dispatched.as_bool().unwrap_or(false) {
            return Err(HarnessError::ElementNotFound {
                selector: selector.to_string(),
            });
        }
        Ok(())
    }

    /// Evaluate an expression in page context and return its JSON value.
    /// An in-page throw surfaces as `Evaluation` with the page's message.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, HarnessError> {
        self.driver()?.evaluate(expression).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_script_embeds_selector_and_event_as_literals() {
        let script = dispatch_script("#file-drop-zone", "dragenter");
        assert!(script.contains("\"#file-drop-zone\""));
        assert!(script.contains("new Event(\"dragenter\""));
        assert!(script.contains("bubbles: true"));
    }

    #[test]
    fn click_text_script_matches_trimmed_leaf_text() {
        let script = click_text_script("Mit Server synchronisieren");
        assert!(script.contains("\"Mit Server synchronisieren\""));
        assert!(script.contains("textContent.trim()"));
    }
}
