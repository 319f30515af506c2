//! HTML fragment rendering.
//!
//! Every function here maps a collection snapshot to the full markup of one
//! list container; callers replace the container wholesale. Field values are
//! interpolated as stored. Input is sanitized before it is stored, so no
//! escaping happens here.

mod date;

pub use date::format_date;

use crate::models::{Activity, BlogPost, ContactMessage, MessageFilter};

/// Admin listing shows this many characters of a post before cutting it off.
const EXCERPT_CHARS: usize = 200;

fn empty_state(icon: &str, heading: &str, body: &str, action: Option<(&str, &str)>) -> String {
    let button = action
        .map(|(onclick, label)| {
            format!(
                r#"
    <button class="btn btn-primary" onclick="{onclick}">
        <i class="fas fa-plus"></i> {label}
    </button>"#
            )
        })
        .unwrap_or_default();

    format!(
        r#"<div class="empty-state">
    <i class="fas {icon}"></i>
    <h3>{heading}</h3>
    <p>{body}</p>{button}
</div>"#
    )
}

fn image_tag(image: Option<&str>, alt: &str, class: &str) -> String {
    match image {
        Some(src) => format!(
            r#"<img src="{src}" alt="{alt}" class="{class}" onerror="this.style.display='none'">"#
        ),
        None => String::new(),
    }
}

/// First [`EXCERPT_CHARS`] characters of `content`, with `...` when cut.
pub fn excerpt(content: &str) -> String {
    if content.chars().count() > EXCERPT_CHARS {
        let cut: String = content.chars().take(EXCERPT_CHARS).collect();
        format!("{}...", cut)
    } else {
        content.to_string()
    }
}

pub fn render_admin_activities(activities: &[Activity]) -> String {
    if activities.is_empty() {
        return empty_state(
            "fa-calendar-plus",
            "Henüz etkinlik eklenmemiş",
            "İlk etkinliğinizi eklemek için \"Yeni Etkinlik\" butonuna tıklayın!",
            Some(("showAddActivityForm()", "İlk Etkinliği Ekle")),
        );
    }

    activities
        .iter()
        .map(|activity| {
            let time = activity
                .time
                .as_deref()
                .map(|t| format!(r#" • <i class="fas fa-clock"></i> {t}"#))
                .unwrap_or_default();
            let capacity = activity
                .capacity
                .map(|c| format!(r#" • <i class="fas fa-users"></i> {c} kişi"#))
                .unwrap_or_default();

            format!(
                r#"<div class="content-item" data-id="{id}">
    <div class="content-item-header">
        <div>
            <div class="content-item-title">{title}</div>
            <div class="content-item-meta">
                <i class="fas fa-calendar"></i> {date}{time}
                <br>
                <i class="fas fa-map-marker-alt"></i> {location}{capacity}
            </div>
        </div>
        <div class="content-item-actions">
            <button class="btn btn-warning btn-sm" onclick="editActivity({id})"><i class="fas fa-edit"></i> Düzenle</button>
            <button class="btn btn-danger btn-sm" onclick="deleteActivity({id})"><i class="fas fa-trash"></i> Sil</button>
        </div>
    </div>
    <p>{description}</p>
    {image}
</div>"#,
                id = activity.id,
                title = activity.title,
                date = format_date(&activity.date),
                location = activity.location,
                description = activity.description,
                image = image_tag(activity.image.as_deref(), &activity.title, "content-item-image"),
            )
        })
        .collect()
}

pub fn render_admin_blog_posts(posts: &[BlogPost]) -> String {
    if posts.is_empty() {
        return empty_state(
            "fa-blog",
            "Henüz blog yazısı eklenmemiş",
            "İlk blog yazınızı eklemek için \"Yeni Blog Yazısı\" butonuna tıklayın!",
            Some(("showAddBlogForm()", "İlk Blog Yazısını Ekle")),
        );
    }

    posts
        .iter()
        .map(|post| {
            let category = post
                .category
                .map(|c| format!(r#" • <i class="fas fa-tag"></i> {}"#, c.display_name()))
                .unwrap_or_default();
            let tags = if post.tags.is_empty() {
                String::new()
            } else {
                format!(r#" • <i class="fas fa-hashtag"></i> {}"#, post.tags.join(", "))
            };

            format!(
                r#"<div class="content-item" data-id="{id}">
    <div class="content-item-header">
        <div>
            <div class="content-item-title">{title}</div>
            <div class="content-item-meta">
                <i class="fas fa-user"></i> {author}{category}
                <br>
                <i class="fas fa-calendar"></i> {date}{tags}
            </div>
        </div>
        <div class="content-item-actions">
            <button class="btn btn-warning btn-sm" onclick="editBlogPost({id})"><i class="fas fa-edit"></i> Düzenle</button>
            <button class="btn btn-danger btn-sm" onclick="deleteBlogPost({id})"><i class="fas fa-trash"></i> Sil</button>
        </div>
    </div>
    <p>{excerpt}</p>
    {image}
</div>"#,
                id = post.id,
                title = post.title,
                author = post.author,
                date = format_date(&post.created_at),
                excerpt = excerpt(&post.content),
                image = image_tag(post.image.as_deref(), &post.title, "content-item-image"),
            )
        })
        .collect()
}

/// Render `messages` as already filtered by `filter`; the filter only picks
/// the empty-state wording.
pub fn render_admin_messages(messages: &[ContactMessage], filter: MessageFilter) -> String {
    if messages.is_empty() {
        let heading = match filter {
            MessageFilter::All => "Henüz mesaj bulunmuyor",
            MessageFilter::Unread => "Okunmamış mesaj bulunmuyor",
            MessageFilter::Read => "Okunmuş mesaj bulunmuyor",
        };
        return empty_state(
            "fa-envelope",
            heading,
            "İletişim formundan gelen mesajlar burada görünecek.",
            None,
        );
    }

    messages
        .iter()
        .map(|message| {
            let (class, badge, toggle) = if message.read {
                (
                    "",
                    "",
                    format!(
                        r#"<button class="btn btn-warning btn-sm" onclick="markAsUnread({})"><i class="fas fa-envelope"></i> Okunmadı İşaretle</button>"#,
                        message.id
                    ),
                )
            } else {
                (
                    " unread-message",
                    r#" <span class="unread-badge">Yeni</span>"#,
                    format!(
                        r#"<button class="btn btn-success btn-sm" onclick="markAsRead({})"><i class="fas fa-check"></i> Okundu İşaretle</button>"#,
                        message.id
                    ),
                )
            };

            format!(
                r#"<div class="content-item{class}" data-id="{id}">
    <div class="content-item-header">
        <div>
            <div class="content-item-title">{name}{badge}</div>
            <div class="content-item-meta">
                <i class="fas fa-envelope"></i> {email}
                <br>
                <i class="fas fa-calendar"></i> {date}
            </div>
        </div>
        <div class="content-item-actions">
            {toggle}
            <button class="btn btn-danger btn-sm" onclick="deleteMessage({id})"><i class="fas fa-trash"></i> Sil</button>
        </div>
    </div>
    <div class="message-content">
        <p>{body}</p>
    </div>
</div>"#,
                id = message.id,
                name = message.name,
                email = message.email,
                date = format_date(&message.created_at),
                body = message.message,
            )
        })
        .collect()
}

pub fn render_public_activities(activities: &[Activity]) -> String {
    if activities.is_empty() {
        return r#"<div class="no-content">
    <i class="fas fa-calendar-plus"></i>
    <h3>Henüz etkinlik eklenmemiş</h3>
    <p>Yaklaşan etkinliklerimiz yakında burada olacak!</p>
</div>"#
            .to_string();
    }

    activities
        .iter()
        .map(|activity| {
            format!(
                r#"<div class="activity-card">
    {image}
    <h3>{title}</h3>
    <div class="activity-date"><i class="fas fa-calendar"></i> {date}</div>
    <div class="activity-location"><i class="fas fa-map-marker-alt"></i> {location}</div>
    <p class="activity-description">{description}</p>
</div>"#,
                image = image_tag(activity.image.as_deref(), &activity.title, "activity-image"),
                title = activity.title,
                date = format_date(&activity.date),
                location = activity.location,
                description = activity.description,
            )
        })
        .collect()
}

pub fn render_public_blog_posts(posts: &[BlogPost]) -> String {
    if posts.is_empty() {
        return r#"<div class="no-content">
    <i class="fas fa-blog"></i>
    <h3>Henüz blog yazısı eklenmemiş</h3>
    <p>Yeni yazılarımız yakında burada olacak!</p>
</div>"#
            .to_string();
    }

    posts
        .iter()
        .map(|post| {
            format!(
                r#"<div class="blog-card">
    {image}
    <h3>{title}</h3>
    <div class="blog-author"><i class="fas fa-user"></i> {author} - {date}</div>
    <p class="blog-content">{content}</p>
</div>"#,
                image = image_tag(post.image.as_deref(), &post.title, "blog-image"),
                title = post.title,
                author = post.author,
                date = format_date(&post.created_at),
                content = post.content,
            )
        })
        .collect()
}

/// Public page shell with both grids filled in.
pub fn render_public_page(site_name: &str, activities: &[Activity], posts: &[BlogPost]) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="tr">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{site_name}</title>
</head>
<body>
    <section id="etkinlikler">
        <h2>Etkinlikler</h2>
        <div id="activities-grid" class="activities-grid">
{activities}
        </div>
    </section>
    <section id="blog">
        <h2>Blog</h2>
        <div id="blog-grid" class="blog-grid">
{posts}
        </div>
    </section>
    <section id="iletisim">
        <h2>İletişim</h2>
        <form id="contactForm" data-endpoint="/api/contact">
            <input type="text" name="name" required>
            <input type="email" name="email" required>
            <textarea name="message" required></textarea>
            <button type="submit">Gönder</button>
        </form>
    </section>
</body>
</html>"#,
        activities = render_public_activities(activities),
        posts = render_public_blog_posts(posts),
    )
}
