use chrono::{Duration, Utc};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
use std::collections::BTreeMap;

use blogicum_core::domain::{Comment, Post, PostQuery};
use blogicum_core::error::RepoError;
use blogicum_core::pagination::PageRequest;
use blogicum_core::ports::{BaseRepository, CommentRepository, PostRepository, UserRepository};

use crate::database::entity::{comment, post, user};
use crate::database::postgres_repo::{
    PostgresCommentRepository, PostgresPostRepository, PostgresUserRepository,
};

fn post_model(id: i64, author_id: i64) -> post::Model {
    let now = Utc::now();
    post::Model {
        id,
        title: format!("Post {id}"),
        text: "Content".to_owned(),
        pub_date: (now - Duration::hours(id)).into(),
        author_id,
        category_id: Some(1),
        location_id: None,
        image: None,
        is_published: true,
        created_at: now.into(),
    }
}

fn count_row(total: i64) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([("num_items", Value::BigInt(Some(total)))])
}

fn comment_count_row(post_id: i64, count: i64) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([
        ("post_id", Value::BigInt(Some(post_id))),
        ("comment_count", Value::BigInt(Some(count))),
    ])
}

#[tokio::test]
async fn test_find_post_by_id() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![post_model(4, 9)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result: Option<Post> = repo.find_by_id(4).await.unwrap();

    let post = result.unwrap();
    assert_eq!(post.title, "Post 4");
    assert_eq!(post.id, 4);
    assert_eq!(post.author_id, 9);
}

#[tokio::test]
async fn test_delete_missing_post_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result = BaseRepository::<Post, i64>::delete(&repo, 42).await;
    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_list_annotates_comment_counts() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![count_row(2)]])
        .append_query_results(vec![vec![post_model(1, 9), post_model(2, 9)]])
        .append_query_results(vec![vec![comment_count_row(2, 3)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let page = repo
        .list(PostQuery::public(Utc::now()), &PageRequest::first())
        .await
        .unwrap();

    assert_eq!(page.window.total, 2);
    assert_eq!(page.window.num_pages, 1);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].comment_count, 0);
    assert_eq!(page.items[1].comment_count, 3);
}

#[tokio::test]
async fn test_find_comment_scoped_to_post() {
    let now = Utc::now();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<comment::Model>::new()])
        .append_query_results(vec![vec![comment::Model {
            id: 5,
            text: "Hi".to_owned(),
            post_id: 2,
            author_id: 9,
            created_at: now.into(),
        }]])
        .into_connection();

    let repo = PostgresCommentRepository::new(db);

    assert!(repo.find_on_post(3, 5).await.unwrap().is_none());

    let comment: Comment = repo.find_on_post(2, 5).await.unwrap().unwrap();
    assert_eq!(comment.post_id, 2);
}

#[tokio::test]
async fn test_find_user_by_username() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![user::Model {
            id: 1,
            username: "ada".to_owned(),
            email: "ada@example.com".to_owned(),
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            password_hash: "hash".to_owned(),
            is_staff: false,
            date_joined: Utc::now().into(),
        }]])
        .into_connection();

    let repo = PostgresUserRepository::new(db);

    let user = repo.find_by_username("ada").await.unwrap().unwrap();
    assert_eq!(user.id, 1);
    assert_eq!(user.first_name, "Ada");
}
