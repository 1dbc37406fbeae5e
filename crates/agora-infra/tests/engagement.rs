//! Engagement engine behaviour against the in-memory adapters.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use agora_core::domain::{Notification, NotificationKind, User};
use agora_core::error::{DomainError, RepoError};
use agora_core::ports::{
    AuthError, BaseRepository, MediaUpload, NotificationRepository, PasswordService,
    PostRepository, UserRepository,
};
use agora_core::services::{
    AccountService, Actor, EngagementService, FeedFilter, LikeToggle, MediaCleanup, NewPost,
    Notifier, PostService, ProfileUpdate, ResetSettings,
};
use agora_infra::{
    InMemoryMailSender, InMemoryMediaStore, InMemoryNotificationRepository,
    InMemoryPostRepository, InMemoryUserRepository,
};

struct PlainPasswords;

impl PasswordService for PlainPasswords {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        Ok(hash == format!("plain:{password}"))
    }
}

struct BrokenNotifications;

#[async_trait]
impl NotificationRepository for BrokenNotifications {
    async fn create(&self, _notification: Notification) -> Result<Notification, RepoError> {
        Err(RepoError::Connection("notification store down".into()))
    }

    async fn find_by_recipient(&self, _user_id: Uuid) -> Result<Vec<Notification>, RepoError> {
        Err(RepoError::Connection("notification store down".into()))
    }
}

struct Harness {
    users: Arc<InMemoryUserRepository>,
    posts: Arc<InMemoryPostRepository>,
    media: Arc<InMemoryMediaStore>,
    mail: Arc<InMemoryMailSender>,
    notifier: Arc<Notifier>,
    engagement: EngagementService,
    post_service: PostService,
    accounts: AccountService,
}

impl Harness {
    fn new() -> Self {
        Self::with_notifications(Arc::new(InMemoryNotificationRepository::new()))
    }

    fn with_notifications(notifications: Arc<dyn NotificationRepository>) -> Self {
        let users = Arc::new(InMemoryUserRepository::new());
        let posts = Arc::new(InMemoryPostRepository::new());
        let media = Arc::new(InMemoryMediaStore::new());
        let mail = Arc::new(InMemoryMailSender::new());
        let notifier = Arc::new(Notifier::new(notifications, users.clone()));

        Self {
            engagement: EngagementService::new(users.clone(), posts.clone(), notifier.clone()),
            post_service: PostService::new(users.clone(), posts.clone(), media.clone()),
            accounts: AccountService::new(
                users.clone(),
                Arc::new(PlainPasswords),
                media.clone(),
                mail.clone(),
                ResetSettings::default(),
            ),
            users,
            posts,
            media,
            mail,
            notifier,
        }
    }

    async fn user(&self, name: &str) -> Actor {
        let user = self
            .accounts
            .register(name, &format!("{name}@example.com"), "password123")
            .await
            .unwrap();
        Actor::new(user.id)
    }

    async fn load(&self, actor: Actor) -> User {
        self.users.find_by_id(actor.id).await.unwrap().unwrap()
    }

    async fn text_post(&self, owner: Actor, text: &str) -> Uuid {
        self.post_service
            .create(
                owner,
                NewPost {
                    text: Some(text.to_string()),
                    media: None,
                },
            )
            .await
            .unwrap()
            .post
            .id
    }

    async fn inbox(&self, actor: Actor) -> Vec<NotificationKind> {
        self.notifier
            .list(actor)
            .await
            .unwrap()
            .into_iter()
            .map(|view| view.notification.kind)
            .collect()
    }
}

fn png() -> MediaUpload {
    MediaUpload {
        content_type: "image/png".to_string(),
        bytes: vec![0x89, b'P', b'N', b'G'],
    }
}

#[tokio::test]
async fn follow_updates_both_sides_and_rejects_repeat() {
    let h = Harness::new();
    let alice = h.user("alice").await;
    let bob = h.user("bob").await;

    let followed = h.engagement.follow(alice, bob.id).await.unwrap();
    assert_eq!(followed.username, "bob");

    assert!(h.load(alice).await.following.contains(&bob.id));
    assert!(h.load(bob).await.followers.contains(&alice.id));
    assert_eq!(h.inbox(bob).await, vec![NotificationKind::Follow]);

    let again = h.engagement.follow(alice, bob.id).await;
    assert!(matches!(again, Err(DomainError::AlreadyFollowing { .. })));
    assert_eq!(h.load(bob).await.followers.len(), 1);
    assert_eq!(h.load(alice).await.following.len(), 1);
    assert_eq!(h.inbox(bob).await.len(), 1);
}

#[tokio::test]
async fn unfollow_removes_both_sides_and_rejects_repeat() {
    let h = Harness::new();
    let alice = h.user("alice").await;
    let bob = h.user("bob").await;
    h.engagement.follow(alice, bob.id).await.unwrap();

    h.engagement.unfollow(alice, bob.id).await.unwrap();

    assert!(h.load(alice).await.following.is_empty());
    assert!(h.load(bob).await.followers.is_empty());
    assert!(matches!(
        h.engagement.unfollow(alice, bob.id).await,
        Err(DomainError::NotFollowing { .. })
    ));
    // Unfollow never notifies.
    assert_eq!(h.inbox(bob).await, vec![NotificationKind::Follow]);
}

#[tokio::test]
async fn follow_rejects_self_and_missing_users() {
    let h = Harness::new();
    let alice = h.user("alice").await;

    assert!(matches!(
        h.engagement.follow(alice, alice.id).await,
        Err(DomainError::Validation(_))
    ));
    assert!(matches!(
        h.engagement.follow(alice, Uuid::new_v4()).await,
        Err(DomainError::NotFound { .. })
    ));
    assert!(matches!(
        h.engagement
            .follow(Actor::new(Uuid::new_v4()), alice.id)
            .await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn rejected_follow_repairs_one_sided_edge() {
    let h = Harness::new();
    let alice = h.user("alice").await;
    let bob = h.user("bob").await;

    // Simulate a follow interrupted after its first write.
    h.users.add_follower(bob.id, alice.id).await.unwrap();

    assert!(matches!(
        h.engagement.follow(alice, bob.id).await,
        Err(DomainError::AlreadyFollowing { .. })
    ));
    assert!(h.load(alice).await.following.contains(&bob.id));
}

#[tokio::test]
async fn concurrent_follows_insert_once() {
    let h = Arc::new(Harness::new());
    let alice = h.user("alice").await;
    let bob = h.user("bob").await;

    let attempts = (0..8).map(|_| {
        let h = h.clone();
        tokio::spawn(async move { h.engagement.follow(alice, bob.id).await.is_ok() })
    });

    let succeeded = futures::future::join_all(attempts)
        .await
        .into_iter()
        .filter(|joined| matches!(joined, Ok(true)))
        .count();

    assert_eq!(succeeded, 1);
    assert_eq!(h.load(bob).await.followers.len(), 1);
    assert_eq!(h.inbox(bob).await.len(), 1);
}

#[tokio::test]
async fn like_is_a_true_toggle_and_notifies_only_on_like() {
    let h = Harness::new();
    let owner = h.user("owner").await;
    let fan = h.user("fan").await;
    let post_id = h.text_post(owner, "hello").await;

    assert_eq!(
        h.engagement.toggle_like(fan, post_id).await.unwrap(),
        LikeToggle::Liked
    );
    let post = h.posts.find_by_id(post_id).await.unwrap().unwrap();
    assert!(post.is_liked_by(fan.id));
    assert!(h.load(fan).await.liked_posts.contains(&post_id));

    assert_eq!(
        h.engagement.toggle_like(fan, post_id).await.unwrap(),
        LikeToggle::Unliked
    );
    let post = h.posts.find_by_id(post_id).await.unwrap().unwrap();
    assert!(post.likes.is_empty());
    assert!(h.load(fan).await.liked_posts.is_empty());

    assert_eq!(h.inbox(owner).await, vec![NotificationKind::Like]);
}

#[tokio::test]
async fn like_on_missing_post_is_not_found() {
    let h = Harness::new();
    let fan = h.user("fan").await;

    assert!(matches!(
        h.engagement.toggle_like(fan, Uuid::new_v4()).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn like_by_unknown_user_leaves_post_untouched() {
    let h = Harness::new();
    let owner = h.user("owner").await;
    let post_id = h.text_post(owner, "hello").await;
    let ghost = Actor::new(Uuid::new_v4());

    assert!(matches!(
        h.engagement.toggle_like(ghost, post_id).await,
        Err(DomainError::NotFound { .. })
    ));
    assert!(
        h.posts
            .find_by_id(post_id)
            .await
            .unwrap()
            .unwrap()
            .likes
            .is_empty()
    );
    assert!(h.inbox(owner).await.is_empty());
}

#[tokio::test]
async fn deleting_a_post_unlinks_it_from_likers() {
    let h = Harness::new();
    let owner = h.user("owner").await;
    let fan = h.user("fan").await;
    let post_id = h.text_post(owner, "hello").await;
    let kept = h.text_post(owner, "still here").await;
    h.engagement.toggle_like(fan, post_id).await.unwrap();
    h.engagement.toggle_like(fan, kept).await.unwrap();

    h.post_service.delete(owner, post_id).await.unwrap();

    let liked = h.load(fan).await.liked_posts;
    assert!(!liked.contains(&post_id));
    assert!(liked.contains(&kept));
}

#[tokio::test]
async fn failed_notification_does_not_undo_like() {
    let h = Harness::with_notifications(Arc::new(BrokenNotifications));
    let owner = h.user("owner").await;
    let fan = h.user("fan").await;
    let post_id = h.text_post(owner, "hello").await;

    assert_eq!(
        h.engagement.toggle_like(fan, post_id).await.unwrap(),
        LikeToggle::Liked
    );
    assert!(
        h.posts
            .find_by_id(post_id)
            .await
            .unwrap()
            .unwrap()
            .is_liked_by(fan.id)
    );

    h.engagement.follow(fan, owner.id).await.unwrap();
    assert!(h.load(owner).await.followers.contains(&fan.id));
}

#[tokio::test]
async fn comment_validates_and_appends_in_order() {
    let h = Harness::new();
    let owner = h.user("owner").await;
    let fan = h.user("fan").await;
    let post_id = h.text_post(owner, "hello").await;

    assert!(matches!(
        h.engagement.comment(fan, post_id, "").await,
        Err(DomainError::Validation(_))
    ));
    assert!(matches!(
        h.engagement.comment(fan, post_id, "   ").await,
        Err(DomainError::Validation(_))
    ));
    assert!(matches!(
        h.engagement.comment(fan, Uuid::new_v4(), "hi").await,
        Err(DomainError::NotFound { .. })
    ));

    let before = Utc::now();
    let first = h.engagement.comment(fan, post_id, "hi").await.unwrap();
    let second = h.engagement.comment(owner, post_id, "thanks").await.unwrap();

    assert!(first.comment.created_at >= before);
    assert_eq!(first.author.map(|a| a.username), Some("fan".to_string()));
    assert_eq!(second.comment.text, "thanks");

    let post = h.posts.find_by_id(post_id).await.unwrap().unwrap();
    let texts: Vec<&str> = post.comments.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["hi", "thanks"]);

    assert_eq!(
        h.inbox(owner).await,
        vec![NotificationKind::Comment, NotificationKind::Comment]
    );
}

#[tokio::test]
async fn create_post_requires_text_or_media() {
    let h = Harness::new();
    let alice = h.user("alice").await;

    let empty = h.post_service.create(alice, NewPost::default()).await;
    assert!(matches!(empty, Err(DomainError::Validation(_))));

    let blank = h
        .post_service
        .create(
            alice,
            NewPost {
                text: Some("  ".into()),
                media: None,
            },
        )
        .await;
    assert!(matches!(blank, Err(DomainError::Validation(_))));

    let view = h
        .post_service
        .create(
            alice,
            NewPost {
                text: Some("hello".into()),
                media: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(view.post.media_type(), "none");
    assert_eq!(view.author.map(|a| a.username), Some("alice".to_string()));
}

#[tokio::test]
async fn create_post_classifies_and_uploads_media() {
    let h = Harness::new();
    let alice = h.user("alice").await;

    let view = h
        .post_service
        .create(
            alice,
            NewPost {
                text: None,
                media: Some(png()),
            },
        )
        .await
        .unwrap();
    assert_eq!(view.post.media_type(), "image");
    let media = view.post.media.unwrap();
    assert!(h.media.contains(&media.public_id).await);

    let unsupported = h
        .post_service
        .create(
            alice,
            NewPost {
                text: Some("doc".into()),
                media: Some(MediaUpload {
                    content_type: "application/pdf".into(),
                    bytes: vec![1, 2, 3],
                }),
            },
        )
        .await;
    assert!(matches!(
        unsupported,
        Err(DomainError::UnsupportedMediaType(_))
    ));
}

#[tokio::test]
async fn failed_upload_leaves_no_post() {
    let h = Harness::new();
    let alice = h.user("alice").await;
    h.media.fail_uploads(true);

    let result = h
        .post_service
        .create(
            alice,
            NewPost {
                text: Some("with media".into()),
                media: Some(png()),
            },
        )
        .await;

    assert!(matches!(result, Err(DomainError::Upload(_))));
    assert!(h.posts.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_post_checks_ownership_and_removes_media() {
    let h = Harness::new();
    let owner = h.user("owner").await;
    let other = h.user("other").await;
    let view = h
        .post_service
        .create(
            owner,
            NewPost {
                text: Some("pic".into()),
                media: Some(png()),
            },
        )
        .await
        .unwrap();
    let post_id = view.post.id;

    assert!(matches!(
        h.post_service.delete(other, post_id).await,
        Err(DomainError::Unauthorized)
    ));

    let deletion = h.post_service.delete(owner, post_id).await.unwrap();
    assert_eq!(deletion.media_cleanup, MediaCleanup::Removed);
    assert!(h.posts.find_by_id(post_id).await.unwrap().is_none());
    assert!(h.media.is_empty().await);

    assert!(matches!(
        h.post_service.delete(owner, post_id).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn delete_post_survives_media_store_failure() {
    let h = Harness::new();
    let owner = h.user("owner").await;
    let view = h
        .post_service
        .create(
            owner,
            NewPost {
                text: None,
                media: Some(png()),
            },
        )
        .await
        .unwrap();
    h.media.fail_deletes(true);

    let deletion = h.post_service.delete(owner, view.post.id).await.unwrap();

    assert!(matches!(deletion.media_cleanup, MediaCleanup::Failed(_)));
    assert!(h.posts.find_by_id(view.post.id).await.unwrap().is_none());
}

#[tokio::test]
async fn feed_filters_by_following_newest_first() {
    let h = Harness::new();
    let alice = h.user("alice").await;
    let bob = h.user("bob").await;
    let carol = h.user("carol").await;

    h.text_post(bob, "first").await;
    h.text_post(carol, "second").await;
    h.text_post(bob, "third").await;
    h.engagement.follow(alice, bob.id).await.unwrap();

    let all = h.post_service.feed(alice, FeedFilter::All).await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(
        all.windows(2)
            .all(|pair| pair[0].post.created_at >= pair[1].post.created_at)
    );

    let following = h
        .post_service
        .feed(alice, FeedFilter::Following)
        .await
        .unwrap();
    assert_eq!(following.len(), 2);
    assert!(following.iter().all(|view| view.post.user_id == bob.id));

    let lonely = h
        .post_service
        .feed(carol, FeedFilter::Following)
        .await
        .unwrap();
    assert!(lonely.is_empty());
}

#[tokio::test]
async fn notifications_resolve_sender_newest_first() {
    let h = Harness::new();
    let owner = h.user("owner").await;
    let fan = h.user("fan").await;
    let post_id = h.text_post(owner, "hello").await;

    h.engagement.follow(fan, owner.id).await.unwrap();
    h.engagement.toggle_like(fan, post_id).await.unwrap();
    h.engagement.comment(fan, post_id, "nice").await.unwrap();

    let inbox = h.notifier.list(owner).await.unwrap();
    assert_eq!(inbox.len(), 3);
    assert!(
        inbox
            .windows(2)
            .all(|pair| pair[0].notification.created_at >= pair[1].notification.created_at)
    );
    assert!(
        inbox
            .iter()
            .all(|view| view.from.as_ref().map(|f| f.username.as_str()) == Some("fan"))
    );
    assert!(h.notifier.list(fan).await.unwrap().is_empty());
}

#[tokio::test]
async fn password_reset_flow() {
    let h = Harness::new();
    let alice = h.user("alice").await;

    assert!(matches!(
        h.accounts.request_password_reset("nobody@example.com").await,
        Err(DomainError::Validation(_))
    ));

    h.accounts
        .request_password_reset("Alice@Example.com")
        .await
        .unwrap();

    let sent = h.mail.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "alice@example.com");
    assert_eq!(sent[0].subject, "Password Reset Link");

    let token = h.load(alice).await.reset_token.unwrap().token;
    assert!(sent[0].body.contains(&token));

    assert!(matches!(
        h.accounts.reset_password(&token, "short").await,
        Err(DomainError::Validation(_))
    ));
    h.accounts
        .reset_password(&token, "new-password")
        .await
        .unwrap();

    assert!(h.load(alice).await.reset_token.is_none());
    assert!(
        h.accounts
            .authenticate("alice@example.com", "new-password")
            .await
            .is_ok()
    );
    assert!(matches!(
        h.accounts.reset_password(&token, "another-password").await,
        Err(DomainError::Validation(_))
    ));
}

#[tokio::test]
async fn mail_failure_surfaces_as_mail_error() {
    let h = Harness::new();
    h.user("alice").await;
    h.mail.fail_deliveries(true);

    assert!(matches!(
        h.accounts.request_password_reset("alice@example.com").await,
        Err(DomainError::Mail(_))
    ));
}

#[tokio::test]
async fn profile_update_replaces_images_and_keeps_graph() {
    let h = Harness::new();
    let alice = h.user("alice").await;
    let bob = h.user("bob").await;
    h.engagement.follow(bob, alice.id).await.unwrap();

    let first = h
        .accounts
        .update_profile(
            alice,
            ProfileUpdate {
                full_name: Some("Alice A".into()),
                profile_img: Some(png()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let old_image = first.profile_img.unwrap().public_id;

    let second = h
        .accounts
        .update_profile(
            alice,
            ProfileUpdate {
                bio: Some("hi there".into()),
                profile_img: Some(png()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(second.full_name.as_deref(), Some("Alice A"));
    assert_eq!(second.bio, "hi there");
    assert!(second.followers.contains(&bob.id));
    assert!(!h.media.contains(&old_image).await);
    assert_eq!(h.media.len().await, 1);
}

#[tokio::test]
async fn profile_update_checks_current_password() {
    let h = Harness::new();
    let alice = h.user("alice").await;

    let wrong = h
        .accounts
        .update_profile(
            alice,
            ProfileUpdate {
                current_password: Some("not-it-at-all".into()),
                new_password: Some("brand-new-pass".into()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(wrong, Err(DomainError::InvalidCredentials)));

    let half = h
        .accounts
        .update_profile(
            alice,
            ProfileUpdate {
                new_password: Some("brand-new-pass".into()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(half, Err(DomainError::Validation(_))));
}

#[tokio::test]
async fn suggested_excludes_self_and_followed() {
    let h = Harness::new();
    let alice = h.user("alice").await;
    let bob = h.user("bob").await;
    let carol = h.user("carol").await;
    h.engagement.follow(alice, bob.id).await.unwrap();

    let suggested: Vec<Uuid> = h
        .accounts
        .suggested(alice)
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.id)
        .collect();

    assert_eq!(suggested, vec![carol.id]);
}

#[tokio::test]
async fn search_rejects_blank_queries() {
    let h = Harness::new();
    h.user("alice").await;
    h.user("bob").await;

    let blank = h.accounts.search("   ").await;
    assert!(matches!(blank, Err(DomainError::Validation(_))));

    let hits = h.accounts.search(" ALI ").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].username, "alice");
}
