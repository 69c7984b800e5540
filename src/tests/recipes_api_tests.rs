#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    use crate::catalog::{self, Catalog};
    use crate::tests::{create_user, field_errors, send, setup, token_for};

    const RECIPES_URL: &str = "/recipe/recipes";

    fn detail_url(id: i64) -> String {
        format!("{}/{}", RECIPES_URL, id)
    }

    async fn sample_recipe(app: &axum::Router, token: &str, title: &str, extra: Value) -> Value {
        let mut payload = json!({"title": title, "time_minutes": 10, "price": "5.00"});
        if let (Some(obj), Some(more)) = (payload.as_object_mut(), extra.as_object()) {
            for (k, v) in more {
                obj.insert(k.clone(), v.clone());
            }
        }
        let (status, body) = send(app, Method::POST, RECIPES_URL, Some(token), Some(payload)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body
    }

    #[tokio::test]
    async fn test_auth_required() {
        let (app, _) = setup().await;

        let (status, _) = send(&app, Method::GET, RECIPES_URL, None, None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_basic_recipe() {
        let (app, state) = setup().await;
        let user = create_user(&state, "test@djangoappdev.com", "testpass").await;
        let token = token_for(&state, &user).await;

        let payload = json!({"title": "Chocolate cheesecake", "time_minutes": 30, "price": 5});
        let (status, body) = send(&app, Method::POST, RECIPES_URL, Some(&token), Some(payload)).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["title"], "Chocolate cheesecake");
        assert_eq!(body["time_minutes"], 30);
        assert_eq!(body["price"], "5.00");
        assert_eq!(body["link"], "");
        assert_eq!(body["tags"], json!([]));
        assert_eq!(body["ingredients"], json!([]));
        assert_eq!(state.metrics.get_snapshot().recipes_created, 1);
    }

    #[tokio::test]
    async fn test_create_recipe_with_tags_and_ingredients() {
        let (app, state) = setup().await;
        let user = create_user(&state, "test@djangoappdev.com", "testpass").await;
        let token = token_for(&state, &user).await;
        let vegan = catalog::create(&state.db, Catalog::Tags, user.id, "Vegan").await.unwrap();
        let dessert = catalog::create(&state.db, Catalog::Tags, user.id, "Dessert").await.unwrap();
        let prawns = catalog::create(&state.db, Catalog::Ingredients, user.id, "Prawns").await.unwrap();

        let body = sample_recipe(
            &app,
            &token,
            "Avocado lime cheesecake",
            json!({"tags": [vegan.id, dessert.id, vegan.id], "ingredients": [prawns.id]}),
        )
        .await;

        let mut expected_tags = vec![vegan.id, dessert.id];
        expected_tags.sort_unstable();
        assert_eq!(body["tags"], json!(expected_tags));
        assert_eq!(body["ingredients"], json!([prawns.id]));
    }

    #[tokio::test]
    async fn test_create_recipe_missing_fields() {
        let (app, state) = setup().await;
        let user = create_user(&state, "test@djangoappdev.com", "testpass").await;
        let token = token_for(&state, &user).await;

        let (status, body) = send(&app, Method::POST, RECIPES_URL, Some(&token), Some(json!({}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let fields = field_errors(&body);
        assert!(fields["title"].is_array());
        assert!(fields["time_minutes"].is_array());
        assert!(fields["price"].is_array());
    }

    #[tokio::test]
    async fn test_create_recipe_invalid_price() {
        let (app, state) = setup().await;
        let user = create_user(&state, "test@djangoappdev.com", "testpass").await;
        let token = token_for(&state, &user).await;

        for price in ["1000.00", "1.234", "-1"] {
            let payload = json!({"title": "Soup", "time_minutes": 5, "price": price});
            let (status, body) = send(&app, Method::POST, RECIPES_URL, Some(&token), Some(payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "price {}", price);
            assert!(field_errors(&body)["price"].is_array());
        }
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes").fetch_one(&state.db).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_create_recipe_with_foreign_tag() {
        let (app, state) = setup().await;
        let user = create_user(&state, "test@djangoappdev.com", "testpass").await;
        let other = create_user(&state, "other@djangoappdev.com", "testpass").await;
        let token = token_for(&state, &user).await;
        let foreign = catalog::create(&state.db, Catalog::Tags, other.id, "Theirs").await.unwrap();

        let payload = json!({"title": "Stolen", "time_minutes": 5, "price": "1.00", "tags": [foreign.id]});
        let (status, body) = send(&app, Method::POST, RECIPES_URL, Some(&token), Some(payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            field_errors(&body)["tags"],
            json!([format!("Invalid pk \"{}\" - object does not exist.", foreign.id)])
        );
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes").fetch_one(&state.db).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_retrieve_recipes_limited_to_user() {
        let (app, state) = setup().await;
        let user = create_user(&state, "test@djangoappdev.com", "testpass").await;
        let other = create_user(&state, "other@djangoappdev.com", "testpass").await;
        let token = token_for(&state, &user).await;
        let other_token = token_for(&state, &other).await;

        sample_recipe(&app, &other_token, "Not mine", json!({})).await;
        let first = sample_recipe(&app, &token, "First", json!({})).await;
        let second = sample_recipe(&app, &token, "Second", json!({})).await;

        let (status, body) = send(&app, Method::GET, RECIPES_URL, Some(&token), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([second, first]));
    }

    #[tokio::test]
    async fn test_view_recipe_detail() {
        let (app, state) = setup().await;
        let user = create_user(&state, "test@djangoappdev.com", "testpass").await;
        let token = token_for(&state, &user).await;
        let tag = catalog::create(&state.db, Catalog::Tags, user.id, "Main course").await.unwrap();
        let ingredient = catalog::create(&state.db, Catalog::Ingredients, user.id, "Cinnamon").await.unwrap();
        let created = sample_recipe(
            &app,
            &token,
            "Sample recipe",
            json!({"tags": [tag.id], "ingredients": [ingredient.id], "link": "https://example.com/r"}),
        )
        .await;
        let id = created["id"].as_i64().unwrap();

        let (status, body) = send(&app, Method::GET, &detail_url(id), Some(&token), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Sample recipe");
        assert_eq!(body["link"], "https://example.com/r");
        assert_eq!(body["tags"], json!([{"id": tag.id, "name": "Main course"}]));
        assert_eq!(body["ingredients"], json!([{"id": ingredient.id, "name": "Cinnamon"}]));
    }

    #[tokio::test]
    async fn test_other_users_recipe_is_not_found() {
        let (app, state) = setup().await;
        let user = create_user(&state, "test@djangoappdev.com", "testpass").await;
        let other = create_user(&state, "other@djangoappdev.com", "testpass").await;
        let token = token_for(&state, &user).await;
        let other_token = token_for(&state, &other).await;
        let theirs = sample_recipe(&app, &other_token, "Private", json!({})).await;
        let url = detail_url(theirs["id"].as_i64().unwrap());

        let (status, _) = send(&app, Method::GET, &url, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::PATCH, &url, Some(&token), Some(json!({"title": "x"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::DELETE, &url, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, Method::GET, &url, Some(&other_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Private");
    }

    #[tokio::test]
    async fn test_partial_update_recipe() {
        let (app, state) = setup().await;
        let user = create_user(&state, "test@djangoappdev.com", "testpass").await;
        let token = token_for(&state, &user).await;
        let spicy = catalog::create(&state.db, Catalog::Tags, user.id, "Spicy").await.unwrap();
        let curry = catalog::create(&state.db, Catalog::Tags, user.id, "Curry").await.unwrap();
        let created = sample_recipe(&app, &token, "Chicken tikka", json!({"tags": [spicy.id]})).await;
        let url = detail_url(created["id"].as_i64().unwrap());

        let (status, body) =
            send(&app, Method::PATCH, &url, Some(&token), Some(json!({"title": "Chicken tikka masala", "tags": [curry.id]})))
                .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Chicken tikka masala");
        assert_eq!(body["time_minutes"], 10);
        assert_eq!(body["price"], "5.00");
        assert_eq!(body["tags"], json!([curry.id]));
    }

    #[tokio::test]
    async fn test_full_update_recipe_clears_links() {
        let (app, state) = setup().await;
        let user = create_user(&state, "test@djangoappdev.com", "testpass").await;
        let token = token_for(&state, &user).await;
        let tag = catalog::create(&state.db, Catalog::Tags, user.id, "Pasta").await.unwrap();
        let created = sample_recipe(&app, &token, "Spaghetti carbonara", json!({"tags": [tag.id]})).await;
        let url = detail_url(created["id"].as_i64().unwrap());

        let payload = json!({"title": "Carbonara", "time_minutes": 25, "price": "5.50", "tags": []});
        let (status, body) = send(&app, Method::PATCH, &url, Some(&token), Some(payload)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["time_minutes"], 25);
        assert_eq!(body["price"], "5.50");
        assert_eq!(body["tags"], json!([]));
        let (_, detail) = send(&app, Method::GET, &url, Some(&token), None).await;
        assert_eq!(detail["tags"], json!([]));
    }

    #[tokio::test]
    async fn test_delete_recipe() {
        let (app, state) = setup().await;
        let user = create_user(&state, "test@djangoappdev.com", "testpass").await;
        let token = token_for(&state, &user).await;
        let tag = catalog::create(&state.db, Catalog::Tags, user.id, "Quick").await.unwrap();
        let created = sample_recipe(&app, &token, "Toast", json!({"tags": [tag.id]})).await;
        let url = detail_url(created["id"].as_i64().unwrap());

        let (status, _) = send(&app, Method::DELETE, &url, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::GET, &url, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // The tag survives; only the link is gone
        let tags = catalog::list(&state.db, Catalog::Tags, user.id, false).await.unwrap();
        assert_eq!(tags.len(), 1);
        assert!(catalog::list(&state.db, Catalog::Tags, user.id, true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filter_recipes_by_tags_and_ingredients() {
        let (app, state) = setup().await;
        let user = create_user(&state, "test@djangoappdev.com", "testpass").await;
        let token = token_for(&state, &user).await;
        let vegan = catalog::create(&state.db, Catalog::Tags, user.id, "Vegan").await.unwrap();
        let vegetarian = catalog::create(&state.db, Catalog::Tags, user.id, "Vegetarian").await.unwrap();
        let feta = catalog::create(&state.db, Catalog::Ingredients, user.id, "Feta").await.unwrap();

        let curry = sample_recipe(&app, &token, "Thai curry", json!({"tags": [vegan.id]})).await;
        let tahini = sample_recipe(&app, &token, "Aubergine", json!({"tags": [vegetarian.id]})).await;
        let salad = sample_recipe(&app, &token, "Greek salad", json!({"ingredients": [feta.id]})).await;
        sample_recipe(&app, &token, "Fish and chips", json!({})).await;

        let url = format!("{}?tags={},{}", RECIPES_URL, vegan.id, vegetarian.id);
        let (status, body) = send(&app, Method::GET, &url, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([tahini, curry]));

        let url = format!("{}?ingredients={}", RECIPES_URL, feta.id);
        let (_, body) = send(&app, Method::GET, &url, Some(&token), None).await;
        assert_eq!(body, json!([salad]));

        let url = format!("{}?tags={}&ingredients={}", RECIPES_URL, vegan.id, feta.id);
        let (_, body) = send(&app, Method::GET, &url, Some(&token), None).await;
        assert_eq!(body, json!([]));

        let (status, _) = send(&app, Method::GET, "/recipe/recipes?tags=abc", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_non_numeric_id_returns_error_body() {
        let (app, state) = setup().await;
        let user = create_user(&state, "test@djangoappdev.com", "testpass").await;
        let token = token_for(&state, &user).await;

        let (status, body) = send(&app, Method::GET, "/recipe/recipes/abc", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert_eq!(body["status"], 404);

        let overflow = format!("{}/99999999999999999999", RECIPES_URL);
        let (status, body) = send(&app, Method::DELETE, &overflow, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");

        let (status, _) = send(&app, Method::GET, "/recipe/recipes/abc", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_oversized_link_lists_rejected() {
        let (app, state) = setup().await;
        let user = create_user(&state, "test@djangoappdev.com", "testpass").await;
        let token = token_for(&state, &user).await;
        let ids: Vec<i64> = (1..=40_000).collect();

        let payload = json!({"title": "Everything", "time_minutes": 5, "price": "1.00", "tags": ids});
        let (status, body) = send(&app, Method::POST, RECIPES_URL, Some(&token), Some(payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(field_errors(&body)["tags"].is_array());
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes").fetch_one(&state.db).await.unwrap();
        assert_eq!(count, 0);

        let created = sample_recipe(&app, &token, "Small", json!({})).await;
        let url = detail_url(created["id"].as_i64().unwrap());
        let (status, body) =
            send(&app, Method::PATCH, &url, Some(&token), Some(json!({"ingredients": (1..=1001).collect::<Vec<i64>>()})))
                .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(field_errors(&body)["ingredients"].is_array());

        let filter = (1..=2000).map(|i| i.to_string()).collect::<Vec<_>>().join(",");
        let (status, body) =
            send(&app, Method::GET, &format!("{}?tags={}", RECIPES_URL, filter), Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }
}
