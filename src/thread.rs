use chrono::{Days, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rand::seq::{index, SliceRandom};
use rand::Rng;
use tracing::{debug, warn};

use crate::config::ThreadConfig;
use crate::error::{CalendarError, Result};
use crate::generator::{fallback_post, CommentPrompt, ContentGenerator, PostPrompt};
use crate::{Assignment, Comment, Persona, Post};

/// Inputs shared by every thread of one period.
#[derive(Debug, Clone, Copy)]
pub struct ThreadContext<'a> {
    pub personas: &'a [Persona],
    pub company_context: &'a str,
    pub period_index: u32,
    pub period_start: NaiveDate,
}

/// Expands an assignment into a timestamped post with its comment thread.
pub struct ThreadSynthesizer<'a, G: ContentGenerator + ?Sized> {
    generator: &'a G,
    config: &'a ThreadConfig,
}

impl<'a, G: ContentGenerator + ?Sized> ThreadSynthesizer<'a, G> {
    pub fn new(generator: &'a G, config: &'a ThreadConfig) -> Self {
        Self { generator, config }
    }

    pub async fn synthesize<R: Rng + ?Sized>(
        &self,
        assignment: &Assignment,
        context: &ThreadContext<'_>,
        rng: &mut R,
    ) -> Result<Post> {
        self.config.validate()?;
        let posted_at =self.post_time(assignment.ordinal, context.period_start, rng)?;

        let author = context.personas.choose(rng).ok_or_else(|| {
            CalendarError::InvalidInput("persona roster is empty".to_string())
        })?;
        let commenters = self.pick_commenters(context.personas, author, rng);

        let prompt = PostPrompt {
            forum: &assignment.forum,
            topics: &assignment.topics,
            persona: author,
            company_context: context.company_context,
        };
        let draft = match self.generator.generate_post(&prompt).await {
            Ok(draft) => draft,
            Err(err) => {
                warn!(
                    ordinal = assignment.ordinal,
                    error = %err,
                    "post generation failed, using fallback post"
                );
                fallback_post(assignment.primary_topic())
            }
        };

        let post_id = format!("P{}-{}", context.period_index, assignment.ordinal);
        let mut post = Post::new(
            post_id,
            assignment.forum.clone(),
            draft.title,
            draft.body,
            author.username.clone(),
            posted_at,
            assignment.topics.clone(),
        );

        self.build_comments(&mut post, &commenters, context, rng).await?;

        debug!(
            post_id = %post.id,
            forum = %post.forum,
            comments = post.comments.len(),
            "synthesized thread"
        );
        Ok(post)
    }

    fn post_time<R: Rng + ?Sized>(
        &self,
        ordinal: usize,
        period_start: NaiveDate,
        rng: &mut R,
    ) -> Result<NaiveDateTime> {
        let offsets = &self.config.day_offsets;
        let day_offset = offsets
            .get(ordinal % offsets.len().max(1))
            .copied()
            .unwrap_or(0);
        let hour = self.config.posting_hours.sample(rng);
        let minute = rng.gen_range(0..60);

        let day = period_start
            .checked_add_days(Days::new(u64::from(day_offset)))
            .ok_or_else(|| CalendarError::InvalidInput("post date out of range".to_string()))?;
        let time = NaiveTime::from_hms_opt(hour, minute, 0)
            .ok_or_else(|| CalendarError::InvalidInput(format!("invalid posting hour {hour}")))?;
        Ok(day.and_time(time))
    }

    fn pick_commenters<'p, R: Rng + ?Sized>(
        &self,
        personas: &'p [Persona],
        author: &Persona,
        rng: &mut R,
    ) -> Vec<&'p Persona> {
        let others: Vec<&Persona> = personas
            .iter()
            .filter(|persona| persona.username != author.username)
            .collect();
        let wanted = self.config.commenters.sample(rng) as usize;
        let amount = wanted.min(others.len());

        index::sample(rng, others.len(), amount)
            .into_iter()
            .map(|idx| others[idx])
            .collect()
    }

    async fn build_comments<R: Rng + ?Sized>(
        &self,
        post: &mut Post,
        commenters: &[&Persona],
        context: &ThreadContext<'_>,
        rng: &mut R,
    ) -> Result<()> {
        let Some((&first, rest)) = commenters.split_first() else {
            return Ok(());
        };

        let delay = self.config.first_delay_minutes.sample(rng);
        let mention = rng.gen::<f64>() < self.config.product_mention_probability;
        let text = self
            .generator
            .generate_comment(&CommentPrompt {
                post_body: &post.body,
                persona: first,
                company_context: context.company_context,
                is_first: true,
                should_mention_product: mention,
                previous_comment: None,
            })
            .await?;
        let first_id = comment_id(post, 1);
        post.push_comment(Comment {
            id: first_id.clone(),
            post_id: post.id.clone(),
            parent_id: None,
            text,
            author: first.username.clone(),
            posted_at: post.last_event_at() + Duration::minutes(i64::from(delay)),
            delay_minutes: delay,
        })?;

        let mut active_parent = first_id;
        for (offset, persona) in rest.iter().copied().enumerate() {
            let delay = self.config.reply_delay_minutes.sample(rng);
            let is_reply = rng.gen::<f64>() < self.config.reply_probability;
            let previous = post
                .comments
                .last()
                .filter(|_| is_reply)
                .map(|comment| comment.text.clone());

            let text = self
                .generator
                .generate_comment(&CommentPrompt {
                    post_body: &post.body,
                    persona,
                    company_context: context.company_context,
                    is_first: false,
                    should_mention_product: false,
                    previous_comment: previous.as_deref(),
                })
                .await?;

            let id = comment_id(post, offset + 2);
            post.push_comment(Comment {
                id: id.clone(),
                post_id: post.id.clone(),
                parent_id: is_reply.then(|| active_parent.clone()),
                text,
                author: persona.username.clone(),
                posted_at: post.last_event_at() + Duration::minutes(i64::from(delay)),
                delay_minutes: delay,
            })?;

            if is_reply && rng.gen::<f64>() < self.config.nest_probability {
                active_parent = id;
            }
        }

        Ok(())
    }
}

fn comment_id(post: &Post, position: usize) -> String {
    let suffix = post.id.strip_prefix('P').unwrap_or(&post.id);
    format!("C{}-{}", suffix, position)
}
