//! Built-in conversation topic catalog

use lingua_common::models::speaking::ConversationTopic;
use lingua_common::models::Difficulty;

struct TopicSpec {
    id: &'static str,
    name: &'static str,
    name_pt: &'static str,
    description: &'static str,
    description_pt: &'static str,
    difficulty: Difficulty,
    category: &'static str,
    sample_questions: &'static [&'static str],
    vocabulary_hints: &'static [&'static str],
    opening_prompts: &'static [&'static str],
}

fn build(spec: TopicSpec) -> ConversationTopic {
    ConversationTopic {
        id: spec.id.to_string(),
        name: spec.name.to_string(),
        name_pt: spec.name_pt.to_string(),
        description: spec.description.to_string(),
        description_pt: spec.description_pt.to_string(),
        difficulty: spec.difficulty,
        category: spec.category.to_string(),
        sample_questions: spec.sample_questions.iter().map(|s| s.to_string()).collect(),
        vocabulary_hints: spec.vocabulary_hints.iter().map(|s| s.to_string()).collect(),
        opening_prompts: spec.opening_prompts.iter().map(|s| s.to_string()).collect(),
    }
}

/// The built-in conversation topic catalog
pub fn builtin_topics() -> Vec<ConversationTopic> {
    use Difficulty::*;

    vec![
        build(TopicSpec {
            id: "topic_daily_routine",
            name: "Daily routine",
            name_pt: "Rotina diária",
            description: "Talk about what you do on a typical day",
            description_pt: "Fale sobre o que você faz em um dia típico",
            difficulty: Beginner,
            category: "personal",
            sample_questions: &[
                "What time do you usually wake up?",
                "What do you have for breakfast?",
                "How do you get to work or school?",
            ],
            vocabulary_hints: &["wake up", "breakfast", "commute", "usually", "after that"],
            opening_prompts: &[
                "Hi! Tell me about your morning. What time do you usually wake up?",
                "Hello! What does a normal day look like for you?",
            ],
        }),
        build(TopicSpec {
            id: "topic_food",
            name: "Food and cooking",
            name_pt: "Comida e culinária",
            description: "Talk about your favorite dishes and cooking habits",
            description_pt: "Fale sobre seus pratos favoritos e hábitos de cozinha",
            difficulty: Beginner,
            category: "lifestyle",
            sample_questions: &[
                "What is your favorite Brazilian dish?",
                "Do you like to cook?",
                "What did you eat yesterday?",
            ],
            vocabulary_hints: &["delicious", "recipe", "ingredients", "taste", "spicy"],
            opening_prompts: &[
                "Hi! I love talking about food. What is your favorite dish?",
            ],
        }),
        build(TopicSpec {
            id: "topic_weekend",
            name: "Weekend plans",
            name_pt: "Planos de fim de semana",
            description: "Talk about what you like to do on weekends",
            description_pt: "Fale sobre o que você gosta de fazer nos fins de semana",
            difficulty: Beginner,
            category: "personal",
            sample_questions: &[
                "What are you doing this weekend?",
                "Do you prefer to stay home or go out?",
            ],
            vocabulary_hints: &["plans", "relax", "hang out", "go out", "stay in"],
            opening_prompts: &[
                "Hey! The weekend is coming. Do you have any plans?",
            ],
        }),
        build(TopicSpec {
            id: "topic_work",
            name: "Work and career",
            name_pt: "Trabalho e carreira",
            description: "Talk about your job, workplace, and career goals",
            description_pt: "Fale sobre seu trabalho e objetivos de carreira",
            difficulty: Intermediate,
            category: "professional",
            sample_questions: &[
                "What do you do for a living?",
                "What is the most challenging part of your job?",
                "Where do you see yourself in five years?",
            ],
            vocabulary_hints: &["deadline", "colleague", "meeting", "promotion", "challenging"],
            opening_prompts: &[
                "Hi! I'd love to hear about your work. What do you do for a living?",
            ],
        }),
        build(TopicSpec {
            id: "topic_travel",
            name: "Travel experiences",
            name_pt: "Experiências de viagem",
            description: "Talk about places you have visited or want to visit",
            description_pt: "Fale sobre lugares que você visitou ou quer visitar",
            difficulty: Intermediate,
            category: "lifestyle",
            sample_questions: &[
                "What is the most interesting place you have ever visited?",
                "If you could travel anywhere, where would you go?",
            ],
            vocabulary_hints: &["destination", "sightseeing", "abroad", "memorable", "culture"],
            opening_prompts: &[
                "Hello! Let's talk about travel. What's the best trip you've ever taken?",
            ],
        }),
        build(TopicSpec {
            id: "topic_opinions",
            name: "Technology and society",
            name_pt: "Tecnologia e sociedade",
            description: "Share opinions on how technology changes daily life",
            description_pt: "Compartilhe opiniões sobre como a tecnologia muda o dia a dia",
            difficulty: Advanced,
            category: "opinion",
            sample_questions: &[
                "Do you think social media brings people together or pushes them apart?",
                "How has your phone changed the way you work?",
            ],
            vocabulary_hints: &["on the other hand", "in my opinion", "drawback", "benefit"],
            opening_prompts: &[
                "Hi! Here's a question: do you think technology makes life better or just busier?",
            ],
        }),
    ]
}
