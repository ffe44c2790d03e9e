use async_trait::async_trait;
use calendar_sim::config::{CalendarConfig, Span, ThreadConfig};
use calendar_sim::thread::ThreadContext;
use calendar_sim::{
    Assignment, CalendarBuilder, CalendarError, CalendarRequest, CommentPrompt, ContentGenerator,
    GenerationError, Period, Persona, PostDraft, PostPrompt, ThreadSynthesizer,
};
use chrono::{Days, NaiveDate, NaiveTime};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct CommentCall {
    username: String,
    is_first: bool,
    should_mention_product: bool,
    previous: Option<String>,
}

#[derive(Default)]
struct ScriptedGenerator {
    fail_posts: bool,
    fail_comments: bool,
    post_calls: AtomicUsize,
    comment_calls: Mutex<Vec<CommentCall>>,
}

impl ScriptedGenerator {
    fn comment_calls(&self) -> Vec<CommentCall> {
        self.comment_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn generate_post(&self, prompt: &PostPrompt<'_>) -> Result<PostDraft, GenerationError> {
        let call = self.post_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_posts {
            return Err(GenerationError::Unparseable("not json".to_string()));
        }
        Ok(PostDraft {
            title: format!("Question {} on {}", call, prompt.topics.join(" ")),
            body: format!(
                "{} wonders how people in {} handle {} lately.",
                prompt.persona.username,
                prompt.forum,
                prompt.topics.join(", ")
            ),
        })
    }

    async fn generate_comment(&self, prompt: &CommentPrompt<'_>) -> Result<String, GenerationError> {
        let mut calls = self.comment_calls.lock().unwrap();
        calls.push(CommentCall {
            username: prompt.persona.username.clone(),
            is_first: prompt.is_first,
            should_mention_product: prompt.should_mention_product,
            previous: prompt.previous_comment.map(str::to_string),
        });
        if self.fail_comments {
            return Err(GenerationError::Api("503 Service Unavailable".to_string()));
        }
        Ok(format!("{} adds thought number {}", prompt.persona.username, calls.len()))
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn personas(count: usize) -> Vec<Persona> {
    (0..count)
        .map(|idx| Persona::new(format!("user_{}", idx), format!("background {}", idx)))
        .collect()
}

fn request(personas: Vec<Persona>, forums: usize, topics: usize, posts: usize) -> CalendarRequest {
    CalendarRequest {
        company_context: "SlideForge - AI-powered presentation tool".to_string(),
        personas,
        forums: (0..forums).map(|idx| format!("r/forum{}", idx)).collect(),
        topics: (0..topics).map(|idx| format!("topic {}", idx)).collect(),
        posts_per_period: posts,
        period_index: 1,
    }
}

async fn build(
    generator: &ScriptedGenerator,
    request: &CalendarRequest,
    previous: Option<&Period>,
    seed: u64,
) -> Result<Period, CalendarError> {
    let config = CalendarConfig::default();
    let mut rng = StdRng::seed_from_u64(seed);
    CalendarBuilder::new(generator, &config)
        .build(request, previous, today(), &mut rng)
        .await
}

#[tokio::test]
async fn three_by_three_scenario_holds_structural_properties() {
    let request = request(personas(3), 3, 3, 3);

    for seed in 0..25 {
        let generator = ScriptedGenerator::default();
        let period = build(&generator, &request, None, seed).await.unwrap();

        assert_eq!(period.posts.len(), 3);
        let ids: HashSet<&str> = period.posts.iter().map(|post| post.id.as_str()).collect();
        assert_eq!(ids.len(), 3);

        let mut per_forum: HashMap<&str, usize> = HashMap::new();
        for post in &period.posts {
            *per_forum.entry(post.forum.as_str()).or_insert(0) += 1;
        }
        assert!(per_forum.values().all(|count| *count <= 2));

        for post in &period.posts {
            assert!((2..=4).contains(&post.comments.len()));
            assert!((15..=90).contains(&post.comments[0].delay_minutes));
            for comment in &post.comments[1..] {
                assert!((10..=120).contains(&comment.delay_minutes));
            }
        }

        let quality = &period.quality;
        for value in [
            quality.overall,
            quality.naturalness,
            quality.persona_variety,
            quality.timing_realism,
            quality.content_diversity,
            quality.anti_spam,
        ] {
            assert!((1.0..=10.0).contains(&value));
        }
    }
}

#[tokio::test]
async fn threads_are_ordered_and_reply_backwards() {
    let request = request(personas(6), 4, 5, 7);

    for seed in 0..20 {
        let generator = ScriptedGenerator::default();
        let period = build(&generator, &request, None, seed).await.unwrap();

        for post in &period.posts {
            let mut previous = post.posted_at;
            let mut seen = HashSet::new();
            for comment in &post.comments {
                assert_eq!(comment.post_id, post.id);
                assert!(comment.posted_at >= previous);
                assert_eq!((comment.posted_at - previous).num_minutes(), i64::from(comment.delay_minutes));
                if let Some(parent) = comment.parent_id.as_deref() {
                    assert!(seen.contains(parent), "{} replies forward to {}", comment.id, parent);
                }
                seen.insert(comment.id.as_str());
                previous = comment.posted_at;
            }
            assert!(post.comments[0].parent_id.is_none());
        }
    }
}

#[tokio::test]
async fn commenters_are_distinct_and_exclude_the_author() {
    let request = request(personas(8), 3, 3, 5);

    for seed in 0..20 {
        let generator = ScriptedGenerator::default();
        let period = build(&generator, &request, None, seed).await.unwrap();

        for post in &period.posts {
            assert!((2..=4).contains(&post.comments.len()));
            let authors: HashSet<&str> = post.comments.iter().map(|c| c.author.as_str()).collect();
            assert_eq!(authors.len(), post.comments.len());
            assert!(!authors.contains(post.author.as_str()));
        }
    }
}

#[tokio::test]
async fn two_personas_yield_a_single_commenter() {
    let request = request(personas(2), 2, 2, 2);
    let generator = ScriptedGenerator::default();

    let period = build(&generator, &request, None, 3).await.unwrap();

    for post in &period.posts {
        assert_eq!(post.comments.len(), 1);
        assert_ne!(post.comments[0].author, post.author);
    }
}

#[tokio::test]
async fn only_first_comment_may_mention_the_product() {
    let request = request(personas(6), 3, 3, 6);

    let mut mentioned = 0;
    for seed in 0..20 {
        let generator = ScriptedGenerator::default();
        build(&generator, &request, None, seed).await.unwrap();

        for call in generator.comment_calls() {
            if !call.is_first {
                assert!(!call.should_mention_product, "{} was asked to mention", call.username);
            } else {
                assert!(call.previous.is_none());
                if call.should_mention_product {
                    mentioned += 1;
                }
            }
        }
    }
    assert!(mentioned > 0);
}

#[tokio::test]
async fn replies_carry_the_previous_comment_and_the_active_parent() {
    let request = request(personas(8), 3, 4, 6);

    let mut nested_below_first = false;
    let mut later_top_level = false;
    for seed in 0..40 {
        let generator = ScriptedGenerator::default();
        let period = build(&generator, &request, None, seed).await.unwrap();

        let calls = generator.comment_calls();
        assert_eq!(calls.len(), period.comment_count());
        let mut calls = calls.into_iter();

        for post in &period.posts {
            let first_id = post.comments[0].id.as_str();
            for (position, comment) in post.comments.iter().enumerate() {
                let call = calls.next().unwrap();
                assert_eq!(call.username, comment.author);
                assert_eq!(call.previous.is_some(), comment.parent_id.is_some(), "{}", comment.id);

                if let Some(previous) = call.previous.as_deref() {
                    assert_eq!(previous, post.comments[position - 1].text);
                }
                match comment.parent_id.as_deref() {
                    Some(parent) if parent != first_id => nested_below_first = true,
                    None if position > 0 => later_top_level = true,
                    _ => {}
                }
            }
        }
    }
    assert!(nested_below_first);
    assert!(later_top_level);
}

#[tokio::test]
async fn synthesizer_rejects_inverted_ranges() {
    let personas = personas(3);
    let mut config = ThreadConfig::default();
    config.commenters = Span::new(4, 2);
    let generator = ScriptedGenerator::default();
    let assignment = Assignment {
        forum: "r/forum0".to_string(),
        topics: vec!["topic 0".to_string()],
        ordinal: 1,
    };
    let context = ThreadContext {
        personas: &personas,
        company_context: "SlideForge - AI-powered presentation tool",
        period_index: 1,
        period_start: today(),
    };
    let mut rng = StdRng::seed_from_u64(4);

    let result = ThreadSynthesizer::new(&generator, &config)
        .synthesize(&assignment, &context, &mut rng)
        .await;

    assert!(matches!(result, Err(CalendarError::Config(_))));
    assert_eq!(generator.post_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn posts_follow_the_day_offset_pattern_and_waking_hours() {
    let request = request(personas(4), 3, 3, 3);
    let generator = ScriptedGenerator::default();

    let period = build(&generator, &request, None, 11).await.unwrap();

    assert_eq!(period.start_date, today());
    assert_eq!(period.end_date, today().checked_add_days(Days::new(6)).unwrap());
    let expected_offsets = [2u64, 4, 6];
    for (post, offset) in period.posts.iter().zip(expected_offsets) {
        assert_eq!(post.posted_at.date(), today().checked_add_days(Days::new(offset)).unwrap());
        let time = post.posted_at.time();
        assert!(time >= NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert!(time <= NaiveTime::from_hms_opt(18, 59, 0).unwrap());
    }
    assert_eq!(period.posts[0].id, "P1-1");
    assert_eq!(period.posts[0].comments[0].id, "C1-1-1");
}

#[tokio::test]
async fn later_periods_shift_the_window() {
    let mut request = request(personas(3), 2, 3, 2);
    request.period_index = 3;
    let generator = ScriptedGenerator::default();

    let period = build(&generator, &request, None, 5).await.unwrap();

    assert_eq!(period.period_index, 3);
    assert_eq!(period.start_date, today().checked_add_days(Days::new(14)).unwrap());
    assert_eq!(period.end_date, today().checked_add_days(Days::new(20)).unwrap());
    assert!(period.posts.iter().all(|post| post.id.starts_with("P3-")));
}

#[tokio::test]
async fn fully_overlapping_history_does_not_starve_the_planner() {
    let request = request(personas(4), 3, 3, 3);
    let generator = ScriptedGenerator::default();
    let first = build(&generator, &request, None, 1).await.unwrap();

    let mut next_request = request.clone();
    next_request.period_index = 2;
    for seed in 0..20 {
        let generator = ScriptedGenerator::default();
        let next = build(&generator, &next_request, Some(&first), seed).await.unwrap();
        assert_eq!(next.posts.len(), 3);
    }
}

#[tokio::test]
async fn unusable_post_output_falls_back_to_help_request() {
    let request = request(personas(3), 1, 1, 1);
    let generator = ScriptedGenerator {
        fail_posts: true,
        ..ScriptedGenerator::default()
    };

    let period = build(&generator, &request, None, 2).await.unwrap();

    assert_eq!(period.posts[0].title, "Looking for advice on topic 0");
    assert!(!period.posts[0].body.is_empty());
    assert!(!period.posts[0].comments.is_empty());
}

#[tokio::test]
async fn comment_failure_aborts_the_whole_calendar() {
    let request = request(personas(3), 2, 2, 2);
    let generator = ScriptedGenerator {
        fail_comments: true,
        ..ScriptedGenerator::default()
    };

    let result = build(&generator, &request, None, 2).await;

    assert!(matches!(result, Err(CalendarError::Generation(_))));
}

#[tokio::test]
async fn invalid_requests_are_rejected_before_generation() {
    let cases = vec![
        request(personas(1), 2, 2, 2),
        request(personas(3), 0, 2, 2),
        request(personas(3), 2, 0, 2),
        request(personas(3), 2, 2, 0),
        request(vec![Persona::new("same", "a"), Persona::new("same", "b")], 2, 2, 2),
    ];

    for case in cases {
        let generator = ScriptedGenerator::default();
        let result = build(&generator, &case, None, 0).await;
        assert!(matches!(result, Err(CalendarError::InvalidInput(_))));
        assert_eq!(generator.post_calls.load(Ordering::SeqCst), 0);
        assert!(generator.comment_calls().is_empty());
    }
}

#[tokio::test]
async fn same_seed_reproduces_the_same_schedule() {
    let request = request(personas(5), 3, 4, 4);

    let first = build(&ScriptedGenerator::default(), &request, None, 99).await.unwrap();
    let second = build(&ScriptedGenerator::default(), &request, None, 99).await.unwrap();

    assert_eq!(first, second);
}
