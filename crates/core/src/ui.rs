//! Selector catalog for the Flow studio UI.
//!
//! Each list is ordered most-specific-first and the resolver walks it in
//! declared order. Several affordances carry Vietnamese variants because
//! the studio serves localized sessions.

use crate::selector::{Candidate, SelectorList};

pub fn prompt_input() -> SelectorList {
    SelectorList::new("prompt input", vec![
        Candidate::AttrContains { base: "textarea", attr: "placeholder", needle: "prompt" },
        Candidate::AttrContains { base: "textarea", attr: "placeholder", needle: "Prompt" },
        Candidate::AttrContains { base: "textarea", attr: "placeholder", needle: "mô tả" },
        Candidate::AttrContains { base: "textarea", attr: "placeholder", needle: "Mô tả" },
        Candidate::Css("textarea"),
        Candidate::Css(r#"[contenteditable="true"]"#),
        Candidate::AttrContains { base: r#"input[type="text"]"#, attr: "placeholder", needle: "prompt" },
    ])
}

pub fn generate_button() -> SelectorList {
    SelectorList::new("generate button", vec![
        Candidate::Text { base: "button", needle: "Generate" },
        Candidate::Text { base: "button", needle: "Tạo" },
        Candidate::Text { base: "button", needle: "Create" },
        Candidate::Css(r#"button[type="submit"]"#),
        Candidate::Text { base: "button", needle: "Tạo video" },
        Candidate::Css(r#"[data-testid="generate-button"]"#),
    ])
}

/// Download affordances: doubles as the poller's success signal and the
/// retriever's trigger.
pub fn download_control() -> SelectorList {
    SelectorList::new("download control", vec![
        Candidate::Text { base: "button", needle: "Download" },
        Candidate::Text { base: "button", needle: "Tải xuống" },
        Candidate::Css("a[download]"),
        Candidate::Css(r#"[data-testid="download-button"]"#),
        Candidate::AttrContains { base: "button", attr: "aria-label", needle: "download" },
        Candidate::AttrContains { base: "button", attr: "aria-label", needle: "tải" },
    ])
}

pub fn media_ready() -> SelectorList {
    SelectorList::new("ready media element", vec![
        Candidate::Css("video[src]"),
        Candidate::Css("video source[src]"),
    ])
}

pub fn error_indicator() -> SelectorList {
    SelectorList::new("error indicator", vec![
        Candidate::ClassFragment("error"),
        Candidate::Css(r#"[role="alert"]"#),
    ])
}

pub fn progress_indicator() -> SelectorList {
    SelectorList::new("progress indicator", vec![
        Candidate::Css(r#"[role="progressbar"]"#),
        Candidate::ClassFragment("progress"),
    ])
}

pub fn sign_in_button() -> SelectorList {
    SelectorList::new("sign-in button", vec![
        Candidate::Css(r#"[data-testid="sign-in-button"]"#),
        Candidate::Text { base: "button", needle: "Đăng nhập" },
        Candidate::Text { base: "button", needle: "Sign in" },
    ])
}

/// Markers that an account is signed in: an avatar image or an
/// account-labelled control.
pub fn identity_indicator() -> SelectorList {
    SelectorList::new("identity indicator", vec![
        Candidate::AttrContains { base: "img", attr: "alt", needle: "avatar" },
        Candidate::AttrContains { base: "img", attr: "alt", needle: "profile" },
        Candidate::AttrContains { base: "", attr: "aria-label", needle: "Account" },
        Candidate::AttrContains { base: "", attr: "aria-label", needle: "Tài khoản" },
    ])
}

pub fn email_input() -> SelectorList {
    SelectorList::new("email field", vec![Candidate::Css(r#"input[type="email"]"#)])
}

pub fn password_input() -> SelectorList {
    SelectorList::new("password field", vec![Candidate::Css(r#"input[type="password"]"#)])
}

pub fn email_next_button() -> SelectorList {
    SelectorList::new("email next button", vec![Candidate::Css("#identifierNext")])
}

pub fn password_next_button() -> SelectorList {
    SelectorList::new("password next button", vec![Candidate::Css("#passwordNext")])
}

/// A verification-code input means the account wants a second factor.
pub fn two_factor_challenge() -> SelectorList {
    SelectorList::new("second-factor challenge", vec![
        Candidate::Css(r#"input[type="tel"]"#),
        Candidate::AttrContains { base: "", attr: "aria-label", needle: "code" },
        Candidate::AttrContains { base: "", attr: "aria-label", needle: "mã" },
    ])
}

/// Entry-point control on the landing page for interactive sessions. The
/// hashed class names churn between releases, hence the layered fallbacks.
pub fn entry_button() -> SelectorList {
    SelectorList::new("entry button", vec![
        Candidate::Css(".sc-c177465c-1.hVamcH.sc-a38764c7-0.fXsrxE"),
        Candidate::Css("button.sc-c177465c-1"),
        Candidate::ClassFragment("sc-c177465c-1"),
        Candidate::Text { base: "button", needle: "Tạo" },
        Candidate::Text { base: "button", needle: "Create" },
    ])
}

pub fn context_menu_save() -> SelectorList {
    SelectorList::new("save-as menu entry", vec![
        Candidate::Text { base: "*", needle: "Save video as" },
    ])
}
