//! Snippets evaluated in the page. Queries run in the document because the
//! text-content candidates and visibility gates have no CSS equivalent the
//! protocol could match natively.

use flowbot::selector::{Candidate, Constraints};

/// Script that finds the first element matching `candidate` under
/// `constraints`, stamps it with `data-flowbot-ref = token` and returns
/// whether anything matched.
pub(crate) fn query_script(
    candidate: &Candidate,
    constraints: Constraints,
    token: &str,
) -> serde_json::Result<String> {
    let (selector, needle) = match candidate {
        Candidate::Text { base, needle } => ((*base).to_string(), Some(*needle)),
        other => (other.css_query().unwrap_or_default(), None),
    };
    let selector = serde_json::to_string(&selector)?;
    let token = serde_json::to_string(token)?;

    let mut checks: Vec<String> = Vec::new();
    if let Some(needle) = needle {
        let needle = serde_json::to_string(needle)?;
        checks.push(format!("(el.textContent || '').includes({needle})"));
    }
    if constraints.visible {
        checks.push("visible(el)".to_string());
    }
    if constraints.enabled {
        checks.push("enabled(el)".to_string());
    }
    let accept = if checks.is_empty() {
        "true".to_string()
    } else {
        checks.join(" && ")
    };

    Ok(format!(
        r#"(() => {{
            const visible = (el) => typeof el.checkVisibility === 'function'
                ? el.checkVisibility({{ checkOpacity: true, checkVisibilityCSS: true }})
                : !!(el.offsetParent || el.getClientRects().length);
            const enabled = (el) => !el.disabled && el.getAttribute('aria-disabled') !== 'true';
            for (const el of document.querySelectorAll({selector})) {{
                if (!({accept})) continue;
                el.setAttribute('data-flowbot-ref', {token});
                return true;
            }}
            return false;
        }})()"#
    ))
}

/// Script that empties the stamped element before fresh text is typed in.
/// Fires an `input` event so framework-bound fields notice the reset.
pub(crate) fn clear_script(ref_selector: &str) -> serde_json::Result<String> {
    let selector = serde_json::to_string(ref_selector)?;
    Ok(format!(
        r#"(() => {{
            const el = document.querySelector({selector});
            if (!el) return false;
            if (el.isContentEditable) {{
                el.textContent = '';
            }} else if ('value' in el) {{
                el.value = '';
            }}
            el.dispatchEvent(new Event('input', {{ bubbles: true }}));
            return true;
        }})()"#
    ))
}

/// Poll the resource-timing buffer until it stops growing. The protocol has
/// no load state beyond `load`, so "network idle" is a quiet window over
/// resource entries, capped at ten seconds.
pub(crate) const NETWORK_IDLE_SCRIPT: &str = r#"
    (async () => {
        const maxChecks = 40;
        const interval = 250;
        const requiredStableMs = 500;

        let last = performance.getEntriesByType('resource').length;
        let stableMs = 0;

        for (let i = 0; i < maxChecks; i++) {
            await new Promise(r => setTimeout(r, interval));
            const cur = performance.getEntriesByType('resource').length;
            if (cur === last && document.readyState === 'complete') {
                stableMs += interval;
                if (stableMs >= requiredStableMs) {
                    return { settled: true, resources: cur };
                }
            } else {
                stableMs = 0;
            }
            last = cur;
        }
        return { settled: false, resources: last };
    })()
"#;
