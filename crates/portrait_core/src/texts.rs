//! User-facing message texts

/// Number of questions in a friend interview
pub const QUESTION_COUNT: usize = 5;

/// The interview, asked in this order
pub const QUESTIONS: [&str; QUESTION_COUNT] = [
    "1️⃣ Первое слово. Когда ты думаешь об этом человеке, какое **одно слово** приходит в голову первым?",
    "2️⃣ Стихия. Если представить его энергию в виде явления природы — что это? (Лесной пожар, тихий омут, горная река, утренний туман...)",
    "3️⃣ Качество. Какое его качество (сильное или уязвимое) замечаешь **только ты**, а другим оно не видно?",
    "4️⃣ Цвет. Если бы у этого человека был цвет, который лучше всего описывает его суть — какой это цвет?",
    "5️⃣ Проявление. В какой момент или в каком деле этот человек становится **самим собой**?",
];

pub const FAILURE_NOTICE: &str = "⚠️ Что-то пошло не так. Мы уже чиним!";

pub const NOT_REGISTERED: &str = "Начни с /start";

/// Greeting for a friend who arrived through a referral link
pub fn interview_intro(first_question: &str) -> String {
    format!(
        "🌟 Твой друг изучает себя и ему важно твое мнение.\n\
         Ответь на 5 коротких вопросов — это займет всего 2 минуты.\n\n\
         {first_question}"
    )
}

/// Club introduction with the user's own referral link
pub fn welcome(link: &str) -> String {
    format!(
        "🌀 **Клуб практик «ЯЗНАЮ»**\n\n\
         Ты когда-нибудь задумывался, как тебя видят другие?\n\
         Не просто со стороны, а в энергии, в проявлениях, в тех качествах, \
         которые заметны только близким?\n\n\
         **Как это работает:**\n\
         1️⃣ Ты отправляешь эту ссылку 10 своим знакомым\n\
         2️⃣ Они отвечают на 5 вопросов о тебе\n\
         3️⃣ Мы анализируем ответы через древнее знание и ИИ\n\
         4️⃣ Ты получаешь свой глубинный портрет\n\n\
         🔗 **Твоя ссылка:**\n`{link}`\n\n\
         Отправь её 10 друзьям. Когда наберется 5 ответов — получишь первый набросок.\n\
         А при 10 ответах — полный портрет с архетипом и приглашением в клуб."
    )
}

/// Thank-you sent to a friend who finished the interview
pub fn reshare(link: &str) -> String {
    format!(
        "✨ Спасибо! Твой ответ очень важен.\n\n\
         **Хочешь узнать, как тебя видят другие?**\n\
         Отправь эту ссылку 10 своим знакомым — получи свой портрет:\n\n\
         `{link}`"
    )
}

pub fn status(count: u32, target: u32) -> String {
    format!("📊 Собрано ответов: {count}/{target}")
}

pub fn portrait_ready(portrait: &str) -> String {
    format!("✨ **Твой портрет готов** ✨\n\n{portrait}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn questions_are_numbered_in_order() {
        for (i, question) in QUESTIONS.iter().enumerate() {
            assert!(question.starts_with(char::from(b'1' + i as u8)), "{question}");
        }
    }

    #[test]
    fn links_are_embedded() {
        assert!(welcome("https://t.me/bot?start=ref_1").contains("`https://t.me/bot?start=ref_1`"));
        assert!(reshare("https://t.me/bot?start=ref_2").ends_with("`https://t.me/bot?start=ref_2`"));
        assert!(interview_intro(QUESTIONS[0]).ends_with(QUESTIONS[0]));
    }

    #[test]
    fn status_line() {
        assert_eq!(status(3, 10), "📊 Собрано ответов: 3/10");
    }
}
