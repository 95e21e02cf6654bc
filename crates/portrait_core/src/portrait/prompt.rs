//! Portrait prompt assembly

use std::fmt::Write;

use crate::FriendAnswerSet;

/// Standing instruction sent as the system message
pub const SYSTEM_INSTRUCTION: &str = "Ты — мудрый проводник, говоришь глубоко и бережно.";

/// Program the closing line of every portrait invites the user to
pub const CLUB_NAME: &str = "ЯЗНАЮ";

/// A personality category offered to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Archetype {
    pub name: &'static str,
    pub traits: &'static str,
    pub shadow: &'static str,
}

pub const ARCHETYPES: [Archetype; 10] = [
    Archetype {
        name: "Опора",
        traits: "надежный, стабильный, заботливый",
        shadow: "забывает себя",
    },
    Archetype {
        name: "Искра",
        traits: "вдохновляющий, творческий, легкий",
        shadow: "разбрасывается",
    },
    Archetype {
        name: "Глубина",
        traits: "мыслитель, интуитивный, чувствительный",
        shadow: "закрытый",
    },
    Archetype {
        name: "Движение",
        traits: "активный, целеустремленный, лидер",
        shadow: "жесткий",
    },
    Archetype {
        name: "Чуткость",
        traits: "эмпатичный, понимающий, дипломат",
        shadow: "без границ",
    },
    Archetype {
        name: "Простота",
        traits: "искренний, прямой, живой",
        shadow: "уязвимый",
    },
    Archetype {
        name: "Мастер",
        traits: "умелый, профессиональный, эксперт",
        shadow: "перфекционист",
    },
    Archetype {
        name: "Перемены",
        traits: "гибкий, свободный, непредсказуемый",
        shadow: "нестабильный",
    },
    Archetype {
        name: "Тишина",
        traits: "спокойный, уравновешенный, наблюдатель",
        shadow: "пассивный",
    },
    Archetype {
        name: "Свет",
        traits: "теплый, принимающий, добрый",
        shadow: "размытый",
    },
];

/// The taxonomy, one archetype per line
pub fn render_archetypes() -> String {
    let mut out = String::from("\n");
    for archetype in &ARCHETYPES {
        let _ = writeln!(
            out,
            "{}: {}, но {}",
            archetype.name, archetype.traits, archetype.shadow
        );
    }
    out
}

/// Number each friend's answers in the order the sets are given
pub fn render_answer_blocks(sets: &[FriendAnswerSet]) -> String {
    let mut out = String::new();
    for (i, set) in sets.iter().enumerate() {
        let _ = writeln!(out, "\nДруг {}:", i + 1);
        for (n, answer) in set.answers.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", n + 1, answer);
        }
    }
    out
}

/// Full user prompt for `count` collected answers
pub fn build_prompt(count: u32, sets: &[FriendAnswerSet]) -> String {
    format!(
        r#"
Ты — мудрый проводник, глубокий психолог. Проанализируй {count} ответов друзей о человеке.

Ответы друзей:
{answers}

Напиши портрет этого человека:
1. Как его видят другие (плюсы, сильные стороны, энергия)
2. Что скрыто от него самого (тень, слепое пятно, минусы)
3. Какой архетип ему ближе всего (из списка ниже) — выбери один или создай свой

Архетипы:
{archetypes}

В конце добавь мягкое приглашение в клуб практик "{CLUB_NAME}", связанное с его тенью.
Говори тепло, образно, про энергию и проявление. Длина: 5-7 предложений.
"#,
        answers = render_answer_blocks(sets),
        archetypes = render_archetypes(),
    )
}
