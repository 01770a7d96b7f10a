//! Image catalog & serving (SPEC_FULL.md §4.6, component C6).

use crate::error::{CoreError, CoreResult};
use crate::models::{ImageRow, RandomImageResponse};
use crate::Core;

/// Picks an image unseen by this session within the last 24h. When the
/// catalog has been exhausted for the session, exclusion is reset and the
/// draw is retried unconstrained (§4.6).
pub async fn random_image(core: &Core, session_id: &str) -> CoreResult<RandomImageResponse> {
    let excluded = core.session_exclusion().excluded_for(session_id);
    let picked = core.store().pick_random_image(&excluded).await?;

    let image = match picked {
        Some(image) => image,
        None => {
            if core.store().count_images().await? == 0 {
                return Err(CoreError::NotFound("image"));
            }
            core.session_exclusion().reset(session_id);
            core.store().pick_random_image(&[]).await?.ok_or(CoreError::NotFound("image"))?
        }
    };

    core.session_exclusion().mark_served(session_id, &image.image_id);
    Ok(RandomImageResponse { image_id: image.image_id, image_url: image.image_url })
}

/// Looks up a catalog row by business id; the server crate uses this to
/// decide whether to stream the static file or return 404 (§4.6).
pub async fn get_by_id(core: &Core, image_id: &str) -> CoreResult<ImageRow> {
    core.store().get_image_by_business_id(image_id).await?.ok_or(CoreError::NotFound("image"))
}
