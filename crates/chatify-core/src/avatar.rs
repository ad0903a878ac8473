//! Avatar resolution port.

use chatify_types::user::UserId;

/// Resolves the public URL of a user's profile image.
///
/// Resolution never fails from the caller's point of view: anything that
/// cannot be resolved (no image, network failure, resolver disabled) is the
/// empty string.
pub trait AvatarResolver: Send + Sync {
    fn resolve_avatar_url(
        &self,
        user_id: UserId,
    ) -> impl std::future::Future<Output = String> + Send;
}
