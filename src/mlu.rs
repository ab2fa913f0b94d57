use crate::error::{ColorError, ColorResult};
use crate::locale::Locale;
use std::collections::BTreeMap;
use std::fmt;

/// An in-memory Multi Localized Unicode entry, as used by ICC `desc`/`cprt`
/// style tags: one Unicode string per `(language, country)` pair, with
/// [`Locale::none()`] acting as the "unspecified" slot most readers fall
/// back to.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Mlu {
    entries: BTreeMap<Locale, String>,
}

impl Mlu {
    /// Allocates an empty multilocalized unicode object.
    #[must_use]
    pub fn new() -> Self {
        Mlu { entries: BTreeMap::new() }
    }

    /// Fills an entry for the given language and country. ASCII-only text
    /// fills the legacy 7-bit slot the same way as Unicode text; both
    /// round-trip through [`Mlu::text`].
    pub fn set_text(&mut self, text: &str, locale: Locale) {
        self.entries.insert(locale, text.to_owned());
    }

    /// Fills an entry, refusing non-ASCII text (mirrors ICC profiles that
    /// only support the legacy ASCII `desc` encoding).
    pub fn set_text_ascii(&mut self, text: &str, locale: Locale) -> bool {
        if !text.is_ascii() {
            return false;
        }
        self.entries.insert(locale, text.to_owned());
        true
    }

    /// Gets the entry for the given language and country.
    pub fn text(&self, locale: Locale) -> ColorResult<String> {
        self.entries
            .get(&locale)
            .cloned()
            .ok_or_else(|| ColorError::ProfileQuery(format!("no MLU entry for locale {locale}")))
    }

    /// Gets the entry for the given language and country, requiring it to
    /// be ASCII.
    pub fn text_ascii(&self, locale: Locale) -> ColorResult<String> {
        let text = self.text(locale)?;
        if text.is_ascii() {
            Ok(text)
        } else {
            Err(ColorError::ProfileQuery(format!("MLU entry for {locale} is not ASCII")))
        }
    }

    /// Obtains the locales stored in this multilocalized unicode object.
    #[must_use]
    pub fn translations(&self) -> Vec<Locale> {
        self.entries.keys().copied().collect()
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&Locale, &String)> {
        self.entries.iter()
    }
}

impl fmt::Debug for Mlu {
    #[cold]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mlu({:?})", self.text(Locale::none()).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mlu() {
        let mut m = Mlu::new();
        m.set_text("Hello 世界！", Locale::none());
        assert_eq!("Hello 世界！", m.text(Locale::none()).unwrap());
        assert!(!m.set_text_ascii("エッロル", Locale::none()));

        m.set_text("a", Locale::new("en_US"));
        assert_eq!("a", m.text_ascii(Locale::new("en_US")).unwrap());

        let mut m = Mlu::new();
        assert!(m.set_text_ascii("OK", Locale::none()));
        assert_eq!("OK", m.text_ascii(Locale::none()).unwrap());
        assert_eq!(vec![Locale::none()], m.translations());
    }
}
