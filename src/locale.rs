//! Trigger phrases and narration texts per spoken language.

use crate::intent::Intent;

/// Language the assistant listens and answers in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    English,
    Russian,
}

const ENGLISH_TRIGGERS: &[(&str, Intent)] = &[
    ("load next", Intent::FetchNext),
    ("show", Intent::Show),
    ("save", Intent::Save),
    ("name breed", Intent::DescribeBreed),
    ("tell about breed", Intent::DescribeBreedInfo),
];

const RUSSIAN_TRIGGERS: &[(&str, Intent)] = &[
    ("следующая", Intent::FetchNext),
    ("показать", Intent::Show),
    ("сохранить", Intent::Save),
    ("назови породу", Intent::DescribeBreed),
    ("расскажи о породе", Intent::DescribeBreedInfo),
];

impl Locale {
    /// Parses a short language code ("en", "ru").
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "en" | "english" => Some(Self::English),
            "ru" | "russian" => Some(Self::Russian),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Russian => "ru",
        }
    }

    /// Ordered trigger table; earlier entries win.
    pub fn triggers(&self) -> &'static [(&'static str, Intent)] {
        match self {
            Self::English => ENGLISH_TRIGGERS,
            Self::Russian => RUSSIAN_TRIGGERS,
        }
    }

    /// Directory name of the small vosk model for this language
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::English => "vosk-model-small-en-us-0.15",
            Self::Russian => "vosk-model-small-ru-0.22",
        }
    }

    pub fn default_model_url(&self) -> String {
        format!(
            "https://alphacephei.com/vosk/models/{}.zip",
            self.default_model()
        )
    }

    pub fn espeak_voice(&self) -> &'static str {
        self.code()
    }

    pub fn greeting(&self) -> &'static str {
        match self {
            Self::English => "Hello! I am a voice assistant that shows dog pictures and tells you about the breed. Say 'load next' to begin.",
            Self::Russian => "Привет! Я голосовой ассистент, который покажет фотографии собак и расскажет о породе. Скажите 'следующая', чтобы начать.",
        }
    }

    pub fn farewell(&self) -> &'static str {
        match self {
            Self::English => "Goodbye!",
            Self::Russian => "До свидания!",
        }
    }

    pub fn model_missing(&self) -> &'static str {
        match self {
            Self::English => "Speech recognition model not found. Downloading it now.",
            Self::Russian => "Модель распознавания речи не найдена. Загружаю её.",
        }
    }

    pub fn loaded(&self) -> &'static str {
        match self {
            Self::English => "A new dog picture has been loaded.",
            Self::Russian => "Загружено новое изображение собаки.",
        }
    }

    pub fn fetch_failed(&self) -> &'static str {
        match self {
            Self::English => "Could not fetch a dog picture.",
            Self::Russian => "Не удалось получить изображение собаки.",
        }
    }

    /// Transport or download failure, as opposed to a refused request
    pub fn fetch_error(&self) -> &'static str {
        match self {
            Self::English => "Error while loading the picture.",
            Self::Russian => "Ошибка при загрузке изображения.",
        }
    }

    pub fn shown(&self) -> &'static str {
        match self {
            Self::English => "Here is the dog picture.",
            Self::Russian => "Вот изображение собаки.",
        }
    }

    /// Precondition message that names the fetch command
    pub fn load_first_hint(&self) -> &'static str {
        match self {
            Self::English => "Load a picture first with the command 'load next'.",
            Self::Russian => "Сначала загрузите изображение командой 'следующая'.",
        }
    }

    pub fn load_first(&self) -> &'static str {
        match self {
            Self::English => "Load a picture first.",
            Self::Russian => "Сначала загрузите изображение.",
        }
    }

    pub fn nothing_to_save(&self) -> &'static str {
        match self {
            Self::English => "There is no picture to save.",
            Self::Russian => "Нет изображения для сохранения.",
        }
    }

    pub fn saved(&self, filename: &str) -> String {
        match self {
            Self::English => format!("Picture saved as {}.", filename),
            Self::Russian => format!("Изображение сохранено как {}.", filename),
        }
    }

    pub fn save_failed(&self) -> &'static str {
        match self {
            Self::English => "Could not save the picture.",
            Self::Russian => "Не удалось сохранить изображение.",
        }
    }

    pub fn no_category(&self) -> &'static str {
        match self {
            Self::English => "I cannot tell the breed from this picture.",
            Self::Russian => "Не удалось определить породу по этому изображению.",
        }
    }

    pub fn breed(&self, breed: &str) -> String {
        match self {
            Self::English => format!("The dog breed is: {}.", breed),
            Self::Russian => format!("Порода собаки: {}.", breed),
        }
    }

    pub fn breed_info(&self, breed: &str, summary: &str) -> String {
        match self {
            Self::English => format!("Here is what I found about the {} breed: {}", breed, summary),
            Self::Russian => format!("Вот что я нашёл о породе {}: {}", breed, summary),
        }
    }

    pub fn breed_not_found(&self, breed: &str) -> String {
        match self {
            Self::English => format!("Could not find information about the {} breed.", breed),
            Self::Russian => format!("Не удалось найти информацию о породе {}.", breed),
        }
    }

    pub fn lookup_failed(&self) -> &'static str {
        match self {
            Self::English => "Something went wrong while looking up information.",
            Self::Russian => "Произошла ошибка при поиске информации.",
        }
    }

    pub fn not_understood(&self) -> &'static str {
        match self {
            Self::English => "I did not understand the command. Please try again.",
            Self::Russian => "Я не понял команду. Попробуйте ещё раз.",
        }
    }

    pub fn not_heard(&self) -> &'static str {
        match self {
            Self::English => "Sorry, I could not make that out.",
            Self::Russian => "Извините, я не расслышал.",
        }
    }
}
