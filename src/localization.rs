//! Localized strings for the update prompt.
//!
//! The presenter asks a [`Localizer`] for each piece of prompt copy and falls
//! back to the built-in English table when neither the embedder's localizer nor
//! the built-in catalog covers the requested locale. Message templates may
//! contain `{app}` and `{version}` placeholders; substitution happens in the
//! presenter.

/// Keys for the localizable prompt strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKey {
    /// Title line of the alert.
    AlertTitle,
    /// Body of the alert; may use `{app}` and `{version}` placeholders.
    AlertMessage,
    /// Label of the "update now" button.
    UpdateButton,
    /// Label of the "remind me next time" button.
    NextTimeButton,
    /// Label of the "skip this version" button.
    SkipButton,
}

/// Locale used when no table covers the requested one.
pub const FALLBACK_LOCALE: &str = "en";

/// Source of localized prompt strings.
///
/// `locale` is a BCP 47-ish tag ("en", "de", "pt-BR"); implementations decide
/// how much of it to honor. Returning `None` defers to the built-in English
/// fallback.
pub trait Localizer: Send + Sync {
    /// Look up `key` for `locale`.
    fn localize(&self, key: TextKey, locale: &str) -> Option<String>;
}

/// Resolve `key` through `localizer`, falling back to built-in English.
pub fn resolve(localizer: &dyn Localizer, key: TextKey, locale: &str) -> String {
    localizer
        .localize(key, locale)
        .or_else(|| BuiltinCatalog.localize(key, FALLBACK_LOCALE))
        .unwrap_or_default()
}

struct Table {
    title: &'static str,
    message: &'static str,
    update: &'static str,
    next_time: &'static str,
    skip: &'static str,
}

const EN: Table = Table {
    title: "Update Available",
    message: "A new version of {app} is available. Would you like to update to version {version}?",
    update: "Update",
    next_time: "Next time",
    skip: "Skip this version",
};

const DE: Table = Table {
    title: "Update verfügbar",
    message: "Eine neue Version von {app} ist verfügbar. Möchten Sie auf Version {version} aktualisieren?",
    update: "Aktualisieren",
    next_time: "Beim nächsten Mal",
    skip: "Diese Version überspringen",
};

const ES: Table = Table {
    title: "Actualización disponible",
    message: "Hay una nueva versión de {app} disponible. ¿Le gustaría actualizar a la versión {version}?",
    update: "Actualizar",
    next_time: "La próxima vez",
    skip: "Omitir esta versión",
};

const FR: Table = Table {
    title: "Mise à jour disponible",
    message: "Une nouvelle version de {app} est disponible. Souhaitez-vous passer à la version {version} ?",
    update: "Mettre à jour",
    next_time: "La prochaine fois",
    skip: "Ignorer cette version",
};

const IT: Table = Table {
    title: "Aggiornamento disponibile",
    message: "È disponibile una nuova versione di {app}. Vuoi aggiornare alla versione {version}?",
    update: "Aggiorna",
    next_time: "La prossima volta",
    skip: "Salta questa versione",
};

const JA: Table = Table {
    title: "アップデートのお知らせ",
    message: "{app} の新しいバージョンがあります。バージョン {version} にアップデートしますか？",
    update: "アップデート",
    next_time: "次回",
    skip: "このバージョンをスキップ",
};

const PT: Table = Table {
    title: "Atualização disponível",
    message: "Há uma nova versão de {app} disponível. Gostaria de atualizar para a versão {version}?",
    update: "Atualizar",
    next_time: "Da próxima vez",
    skip: "Ignorar esta versão",
};

const RU: Table = Table {
    title: "Доступно обновление",
    message: "Доступна новая версия {app}. Хотите обновить до версии {version}?",
    update: "Обновить",
    next_time: "В следующий раз",
    skip: "Пропустить эту версию",
};

const ZH: Table = Table {
    title: "更新可用",
    message: "{app} 有新版本。您想更新到版本 {version} 吗？",
    update: "更新",
    next_time: "下次",
    skip: "跳过此版本",
};

/// Built-in string catalog covering a handful of languages.
///
/// Region subtags are ignored ("pt-BR" resolves the "pt" table); unknown
/// languages resolve to nothing so [`resolve`] falls back to English.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCatalog;

impl BuiltinCatalog {
    fn table(locale: &str) -> Option<&'static Table> {
        let language = locale
            .split(['-', '_'])
            .next()
            .unwrap_or(locale)
            .to_ascii_lowercase();
        match language.as_str() {
            "en" => Some(&EN),
            "de" => Some(&DE),
            "es" => Some(&ES),
            "fr" => Some(&FR),
            "it" => Some(&IT),
            "ja" => Some(&JA),
            "pt" => Some(&PT),
            "ru" => Some(&RU),
            "zh" => Some(&ZH),
            _ => None,
        }
    }
}

impl Localizer for BuiltinCatalog {
    fn localize(&self, key: TextKey, locale: &str) -> Option<String> {
        let table = Self::table(locale)?;
        let text = match key {
            TextKey::AlertTitle => table.title,
            TextKey::AlertMessage => table.message,
            TextKey::UpdateButton => table.update,
            TextKey::NextTimeButton => table.next_time,
            TextKey::SkipButton => table.skip,
        };
        Some(text.to_string())
    }
}
