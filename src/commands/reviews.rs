use chrono::Utc;
use tracing::info;

use super::{guild_id, reply_embed, reply_ephemeral};
use crate::messages::{COLOR_INFO, COLOR_SUCCESS};
use crate::platform::{mention_user, EmbedContent};
use crate::state::reviews::star_bar;
use crate::{Context, Error};

/// Leave a review of the server
#[poise::command(slash_command, guild_only)]
pub async fn review(
    ctx: Context<'_>,
    #[description = "Rating"]
    #[min = 1]
    #[max = 5]
    stars: u8,
    #[description = "Your experience"] description: String,
) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    let review = ctx
        .data()
        .reviews
        .add(guild, ctx.author().id, stars, &description, Utc::now())
        .await?;
    info!("Review posted by {}", ctx.author().name);

    let embed = EmbedContent::new(review.description.clone(), COLOR_SUCCESS)
        .title(format!("New review {}", star_bar(review.stars)))
        .field("Author", mention_user(ctx.author().id), true)
        .thumbnail(Some(ctx.author().face()))
        .timestamped();
    reply_embed(ctx, embed, false).await
}

/// Average rating of the server
#[poise::command(slash_command, guild_only)]
pub async fn review_stats(ctx: Context<'_>) -> Result<(), Error> {
    let guild = guild_id(&ctx)?;
    match ctx.data().reviews.summary(guild).await {
        Some((average, count)) => {
            let embed = EmbedContent::new(
                format!("**{:.2} / 5** from {} review(s)", average, count),
                COLOR_INFO,
            )
            .title(format!("Reviews {}", star_bar(average.round() as u8)));
            reply_embed(ctx, embed, false).await
        }
        None => reply_ephemeral(ctx, "No reviews yet.").await,
    }
}
