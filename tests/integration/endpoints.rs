//! Integration tests for endpoint paths, wire shapes and normalization

use chrono::NaiveDate;
use psref::client::ProductQuery;
use psref::{Cancellation, Date, ModelCode, Pid};
use serde_json::json;

use crate::support::mock_transport::{client, MockTransport};

#[tokio::test]
async fn test_products_hierarchy_preserves_order_and_repairs_urls() {
    let transport = MockTransport::routes(vec![(
        "/",
        json!([{
            "ClassificationName": "Laptops",
            "BackgroundColor": "#fff",
            "ProductLine": [
                {
                    "ProductLineName": "ThinkPad",
                    "ImageUrl": "https://psref.lenovo.com\\syspool\\tp.png",
                    "Series": [{
                        "SeriesName": "ThinkPad X1",
                        "Products": [
                            {"ProductId": 1972, "ProductKey": "ThinkPad_X1_Carbon_Gen_10", "ProductName": "X1 Carbon Gen 10", "P_WdStatus": 0, "LastUpdated": "2024-01-02", "ModelModifyDateTime": "2023-12-30", "ConfigModifyDateTime": "2023-11-01"},
                            {"ProductId": 1500, "ProductKey": "ThinkPad_X1_Yoga", "ProductName": "X1 Yoga", "P_WdStatus": 0}
                        ]
                    }]
                },
                {"ProductLineName": "IdeaPad", "ImageUrl": "", "Series": null}
            ]
        }]),
    )]);

    let types = client(&transport, 1)
        .products(&Cancellation::new())
        .await
        .unwrap();

    assert_eq!(types.len(), 1);
    assert_eq!(types[0].name, "Laptops");
    assert_eq!(types[0].bg_color, "#fff");
    let lines: Vec<_> = types[0].lineup.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(lines, ["ThinkPad", "IdeaPad"]);
    assert_eq!(types[0].lineup[0].image, "https://psref.lenovo.com/syspool/tp.png");

    let products = &types[0].lineup[0].series[0].products;
    assert_eq!(products[0].id, Pid(1972));
    assert_eq!(products[1].id, Pid(1500));
    assert_eq!(products[0].updated, Date::from_ymd(2024, 1, 2));
    assert_eq!(products[0].model_modified, Date::from_ymd(2023, 12, 30));
    assert_eq!(products[0].config_modified, Date::from_ymd(2023, 11, 1));
    assert!(types[0].lineup[1].series.is_empty());
}

#[tokio::test]
async fn test_withdrawn_products_use_legacy_classification_field() {
    let transport = MockTransport::routes(vec![(
        "/psref/mobile/withdrawproducts",
        json!([{
            "ProductType": "Desktops",
            "ProductLine": [{"ProductLineName": "ThinkCentre", "ImageUrl": "a\\b.png", "Series": []}]
        }]),
    )]);

    let types = client(&transport, 1)
        .withdrawn_products(&Cancellation::new())
        .await
        .unwrap();

    assert_eq!(types[0].name, "Desktops");
    assert_eq!(types[0].lineup[0].image, "a/b.png");
}

#[tokio::test]
async fn test_updates_parses_version_and_reasons() {
    let transport = MockTransport::routes(vec![(
        "/psref/mobile/new",
        json!({
            "LatestUpdateVersion": "<b> Version 593 published Jan.2, 2024 </b>",
            "New": [{"productId": 10, "title": "Widget N"}],
            "Updated": [
                {"productId": 11, "title": "Widget X (new model added)"},
                {"productId": 12, "title": "Widget Y (spec updated)"},
                {"productId": 13, "title": "Widget Z (discontinued)"}
            ],
            "Withdrawn": [{"productId": 14, "title": "Widget W (new model added)"}]
        }),
    )]);

    let updates = client(&transport, 1)
        .updates(&Cancellation::new())
        .await
        .unwrap();

    assert_eq!(updates.version, 593);
    assert_eq!(updates.version_ts, NaiveDate::from_ymd_opt(2024, 1, 2));
    assert_eq!(updates.version_title, "Version 593 published Jan.2, 2024");
    assert_eq!(updates.new[0].reason, None);

    let updated: Vec<_> = updates
        .updated
        .iter()
        .map(|u| (u.title.as_str(), u.reason.as_deref()))
        .collect();
    assert_eq!(
        updated,
        [
            ("Widget X", Some("new model added")),
            ("Widget Y", Some("spec updated")),
            ("Widget Z (discontinued)", None)
        ]
    );
    // Only updated entries carry reasons.
    assert_eq!(updates.withdrawn[0].title, "Widget W (new model added)");
}

#[tokio::test]
async fn test_product_by_id_normalizes_urls_and_image() {
    let transport = MockTransport::routes(vec![(
        "/psref/mobile/product/1234",
        json!({
            "ProductId": 1234,
            "ProductKey": "Lenovo_Legion_5P_15IMH05H",
            "Name": "Legion 5P",
            "ProductURL": "https://psref.lenovo.com\\Product\\Legion",
            "Spec": "https://psref.lenovo.com\\syspool\\spec.pdf",
            "US_Pdf": "a\\us.pdf",
            "EMEA_Pdf": "a\\emea.pdf",
            "WW_Pdf": "a\\ww.pdf",
            "ImageForShare": "http%3a%2f%2fpsref.lenovo.com%2fsyspool%2fSys%2fImage%2fLegion%2fshare.png",
            "Images": ["img\\1.png"],
            "Models": [
                {"ModelCode": "82AW006JRK", "Summary": "i7 / 16GB", "Updated": "2021-03-04"},
                {"ModelCode": "82AW0001US", "Summary": "i5 / 8GB", "Updated": null}
            ],
            "Documentations": [{"ProductId": 1234, "DocTitle": "User Guide", "DocLink": "docs\\ug.pdf"}]
        }),
    )]);

    let product = client(&transport, 1)
        .product_by_id(&Cancellation::new(), Pid(1234))
        .await
        .unwrap();

    assert_eq!(product.key, "Lenovo_Legion_5P_15IMH05H");
    assert_eq!(product.ref_url, "https://psref.lenovo.com/Product/Legion");
    assert_eq!(product.spec_url, "https://psref.lenovo.com/syspool/spec.pdf");
    assert_eq!(
        [product.us_pdf.as_str(), product.emea_pdf.as_str(), product.ww_pdf.as_str()],
        ["a/us.pdf", "a/emea.pdf", "a/ww.pdf"]
    );
    assert_eq!(product.image, "http://psref.lenovo.com/syspool/Sys/Image/Legion/share.png");
    assert_eq!(product.images, ["img/1.png"]);
    assert_eq!(product.models[0].code, ModelCode::from("82AW006JRK"));
    assert_eq!(product.models[0].updated, Date::from_ymd(2021, 3, 4));
    assert_eq!(product.models[1].updated, None);
    assert_eq!(product.docs[0].url, "docs/ug.pdf");
}

#[tokio::test]
async fn test_product_query_params_are_sent() {
    let transport = MockTransport::routes(vec![("/psref/mobile/product/7", json!({"ProductId": 7}))]);
    let query = ProductQuery {
        clsf: "Laptops".to_string(),
        page: 3,
        ..Default::default()
    };

    client(&transport, 1)
        .product_with_query(&Cancellation::new(), Pid(7), &query)
        .await
        .unwrap();

    assert_eq!(
        transport.urls(),
        ["http://psref.test/psref/mobile/product/7?api_v=2&clsf=Laptops&pagenumber=3"]
    );
}

#[tokio::test]
async fn test_model_by_id_sets_requested_code() {
    let transport = MockTransport::routes(vec![(
        "/psref/mobile/Model/1234/82AW006JRK",
        json!({
            "ProductId": 1234,
            "ProductKey": "Lenovo_Legion_5P_15IMH05H",
            "ModelURL": "https://psref.lenovo.com\\Detail\\82AW006JRK",
            "M_WdStatus": 1,
            "ModelCode": "",
            "Detail": [
                {"Name": "Processor", "Value": "Intel Core i7-10750H"},
                {"Name": "Memory", "Value": "16GB"}
            ]
        }),
    )]);

    let model = client(&transport, 1)
        .model_by_id(&Cancellation::new(), Pid(1234), &ModelCode::from("82AW006JRK"))
        .await
        .unwrap();

    assert_eq!(model.code.as_str(), "82AW006JRK");
    assert_eq!(model.product.key, "Lenovo_Legion_5P_15IMH05H");
    assert_eq!(model.withdrawn_status, 1);
    assert_eq!(model.ref_url, "https://psref.lenovo.com/Detail/82AW006JRK");
    assert_eq!(model.detail_by_name("Memory"), Some("16GB"));
}

#[tokio::test]
async fn test_model_by_id_tolerates_null_scalars() {
    let transport = MockTransport::routes(vec![(
        "/psref/mobile/Model/1234/82AW006JRK",
        json!({
            "ProductId": 1234,
            "P_WdStatus": null,
            "ModelCode": null,
            "M_WdStatus": null,
            "Detail": [{"Name": "Processor", "Value": "Intel Core i7-10750H"}]
        }),
    )]);

    let model = client(&transport, 3)
        .model_by_id(&Cancellation::new(), Pid(1234), &ModelCode::from("82AW006JRK"))
        .await
        .unwrap();

    assert_eq!(transport.calls(), 1);
    assert_eq!(model.code.as_str(), "82AW006JRK");
    assert_eq!(model.withdrawn_status, 0);
    assert_eq!(model.product.withdrawn_status, 0);
    assert_eq!(model.detail_by_name("Processor"), Some("Intel Core i7-10750H"));
}

#[tokio::test]
async fn test_books_and_search() {
    let transport = MockTransport::routes(vec![
        (
            "/psref/mobile/book",
            json!([{"BookTitle": "Quick Reference", "BookLink": "books\\qr.pdf", "Geo": "WW", "Remark": ""}]),
        ),
        (
            "/psref/mobile/searchv3",
            json!({"result": [{"ProductId": 1163, "ProductName": "Flex 5G", "ModelCount": 1}]}),
        ),
    ]);
    let c = client(&transport, 1);
    let cancel = Cancellation::new();

    let books = c.books(&cancel).await.unwrap();
    assert_eq!(books[0].title, "Quick Reference");
    assert_eq!(books[0].url, "books/qr.pdf");

    let hits = c.search(&cancel, "82AK0002US").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, Pid(1163));
    assert_eq!(hits[0].models, 1);
}

#[tokio::test]
async fn test_search_with_null_result_is_empty() {
    let transport =
        MockTransport::routes(vec![("/psref/mobile/searchv3", json!({"result": null}))]);
    let hits = client(&transport, 1)
        .search(&Cancellation::new(), "nothing")
        .await
        .unwrap();
    assert!(hits.is_empty());
}
