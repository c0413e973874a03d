// Submission mapper: field-for-field translation of an exported submission
// into a Lemmy create-post request. The permalink goes into the post body
// so every imported post points back at its origin.

use crate::api::{CommunityId, CreatePost};
use crate::session::Session;
use crate::submission::Submission;

pub fn to_create_post(
    submission: &Submission,
    session: &Session,
    community_id: CommunityId,
) -> CreatePost {
    CreatePost {
        name: submission.title.clone(),
        community_id,
        url: submission.url.clone(),
        body: submission.permalink.clone(),
        nsfw: submission.over_18,
        auth: session.token().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::test_session;
    use crate::submission::decode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn maps_sample_without_url() {
        let submission = decode(
            r#"{"title":"A","permalink":"/p/1","url":"","author":"u","created_utc":1,"id":"1","over_18":false,"subreddit_name_prefixed":"r/x"}"#,
        )
        .unwrap();
        let request = to_create_post(&submission, &test_session("jwt"), CommunityId(7));

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "name": "A",
                "community_id": 7,
                "body": "/p/1",
                "nsfw": false,
                "auth": "jwt",
            })
        );
    }

    #[test]
    fn maps_link_and_nsfw() {
        let submission = Submission {
            title: "Cats".into(),
            permalink: "/r/x/comments/abc/cats/".into(),
            url: Some("https://i.example/cat.png".into()),
            author: "u".into(),
            created_utc: 1_600_000_000,
            id: "abc".into(),
            over_18: true,
            subreddit_name_prefixed: "r/x".into(),
        };
        let request = to_create_post(&submission, &test_session("jwt"), CommunityId(2));

        assert_eq!(request.name, "Cats");
        assert_eq!(request.url.as_deref(), Some("https://i.example/cat.png"));
        assert_eq!(request.body, "/r/x/comments/abc/cats/");
        assert!(request.nsfw);
        assert_eq!(request.community_id, CommunityId(2));
        assert_eq!(
            serde_json::to_value(&request).unwrap()["url"],
            "https://i.example/cat.png"
        );
    }
}
