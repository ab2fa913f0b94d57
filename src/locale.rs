use std::cmp;
use std::fmt;
use std::fmt::Write;

/// Language code from ISO-639/2 and region code from ISO-3166, used to key
/// [`crate::Mlu`] entries and the `desc`/`cprt` multi-localized tags of a
/// profile.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Locale {
    language: [u8; 2],
    country: [u8; 2],
}

impl Locale {
    /// A string in format: 2-letter language name, separator, 2-letter
    /// country name, e.g. `"en_US"`.
    pub fn new(locale_name: &str) -> Self {
        let (language_str, country_str) = locale_name.split_at(cmp::min(locale_name.len(), 3));

        let mut locale = Locale {
            language: [0; 2],
            country: [0; 2],
        };
        for (c, s) in locale.language.iter_mut().zip(language_str.bytes().take(2)) {
            *c = s;
        }
        for (c, s) in locale.country.iter_mut().zip(country_str.bytes().take(2)) {
            *c = s;
        }
        locale
    }

    /// Default/unspecified/any locale.
    pub fn none() -> Self {
        Locale {
            language: [0; 2],
            country: [0; 2],
        }
    }

    /// Builds a locale directly from its 2-byte language and country
    /// codes, as stored in an ICC `mluc` tag record.
    pub(crate) fn from_bytes(language: [u8; 2], country: [u8; 2]) -> Self {
        Locale { language, country }
    }

    pub(crate) fn language_bytes(&self) -> [u8; 2] {
        self.language
    }

    pub(crate) fn country_bytes(&self) -> [u8; 2] {
        self.country
    }
}

impl<'a> From<&'a str> for Locale {
    fn from(s: &'a str) -> Self {
        Locale::new(s)
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::none()
    }
}

impl fmt::Debug for Locale {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        <Locale as fmt::Display>::fmt(self, f)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for &c in self.language.iter().take_while(|&&c| c != 0) {
            f.write_char(c as char)?;
        }
        f.write_char('_')?;
        for &c in self.country.iter().take_while(|&&c| c != 0) {
            f.write_char(c as char)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale() {
        let l = Locale::new("");
        assert_eq!([0u8; 2], l.language);
        assert_eq!([0u8; 2], l.country);

        let l = Locale::none();
        assert_eq!([0u8; 2], l.language);
        assert_eq!([0u8; 2], l.country);

        let l = Locale::new("Ab");
        assert_eq!([b'A', b'b'], l.language);
        assert_eq!([0u8; 2], l.country);

        let l = Locale::new("Ab-X");
        assert_eq!([b'A', b'b'], l.language);
        assert_eq!([b'X', 0], l.country);

        let l = Locale::new("overlong");
        assert_eq!([b'o', b'v'], l.language);
        assert_eq!([b'r', b'l'], l.country);
        assert_eq!("ov_rl", l.to_string());
    }
}
