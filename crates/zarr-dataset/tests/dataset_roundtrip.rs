//! Write datasets to a temporary directory and read them back through a
//! [`FilesystemSource`].

use test_utils::{
    assert_approx_eq, assert_point_approx_eq, create_grid_with_missing, create_test_cube,
    cube_value, location, points, TempDataDir,
};
use zarr_dataset::storage::create_filesystem_storage;
use zarr_dataset::synthetic::value_at;
use zarr_dataset::time::parse_time;
use zarr_dataset::{
    synthetic_weather, Coordinate, DatasetDefinition, DatasetError, DatasetSource,
    DatasetWriter, FilesystemSource, PointQuery, SyntheticConfig, VariableDefinition,
    VariableValue, WriterConfig, ZarrCompression,
};

/// 11×11 grid over the default ranges (1° spacing), five days.
fn small_config() -> SyntheticConfig {
    SyntheticConfig {
        lat_points: 11,
        lon_points: 11,
        days: 5,
        ..Default::default()
    }
}

fn write(data: &TempDataDir, definition: &DatasetDefinition, config: WriterConfig) {
    let store = create_filesystem_storage(data.path(), location::BUCKET, location::PATH, true)
        .expect("Failed to create store");
    DatasetWriter::new(config)
        .write(store, definition)
        .expect("Failed to write dataset");
}

fn synthetic_source() -> (TempDataDir, FilesystemSource) {
    let data = TempDataDir::new();
    let config = small_config();
    let created_at = parse_time("2024-05-01T12:00:00").unwrap();
    let definition = synthetic_weather(&config, created_at).unwrap();
    write(&data, &definition, WriterConfig {
        spatial_chunk_size: 4,
        ..Default::default()
    });
    let source = FilesystemSource::new(data.path());
    (data, source)
}

#[test]
fn test_synthetic_dataset_structure() {
    let (_data, source) = synthetic_source();
    let dataset = source.open(location::BUCKET, location::PATH).unwrap();

    assert_eq!(
        dataset.variable_names(),
        vec!["humidity", "pressure", "temperature"]
    );
    assert_eq!(dataset.dimension("time").unwrap().size, 5);
    assert_eq!(dataset.dimension("latitude").unwrap().size, 11);
    assert_eq!(dataset.dimension("longitude").unwrap().size, 11);

    let temperature = dataset.variable("temperature").unwrap();
    assert_eq!(temperature.dimensions(), ["time", "latitude", "longitude"]);
    assert_eq!(temperature.attributes()["units"], "degC");

    let times = dataset.coordinate("time").unwrap().as_time().unwrap();
    assert_eq!(times[0], parse_time("2023-01-01").unwrap());
    assert_eq!(times[4], parse_time("2023-01-05").unwrap());
}

#[test]
fn test_exact_grid_point_is_returned() {
    let (_data, source) = synthetic_source();
    let dataset = source.open(location::BUCKET, location::PATH).unwrap();

    let result = dataset
        .query_point(&PointQuery::new(33.0, 137.0).with_time("2023-01-03"))
        .unwrap();

    assert_eq!(result.latitude, 33.0);
    assert_eq!(result.longitude, 137.0);
    assert_eq!(result.values.len(), 3);

    for name in ["temperature", "humidity", "pressure"] {
        let expected = value_at(name, 2, 33.0, 137.0).unwrap();
        match &result.values[name] {
            VariableValue::Scalar(v) => assert_approx_eq!(*v, expected, 1e-9),
            other => panic!("expected scalar for {}, got {:?}", name, other),
        }
    }
}

#[test]
fn test_nearest_point_and_tie_breaking() {
    let (_data, source) = synthetic_source();
    let dataset = source.open(location::BUCKET, location::PATH).unwrap();

    let result = dataset
        .query_point(&PointQuery::new(30.5, 131.2).with_variable_list("pressure"))
        .unwrap();
    assert_eq!(result.latitude, 31.0);
    assert_eq!(result.longitude, 131.0);

    let result = dataset.query_point(&PointQuery::new(-45.0, 200.0)).unwrap();
    assert_eq!(result.latitude, 30.0);
    assert_eq!(result.longitude, 140.0);

    let result = dataset
        .query_point(&PointQuery::new(points::OUTSIDE.0, points::OUTSIDE.1))
        .unwrap();
    assert_point_approx_eq!(
        (result.latitude, result.longitude),
        (points::SW_CORNER.0, points::SW_CORNER.1),
        1e-9
    );
}

#[test]
fn test_series_without_time() {
    let (_data, source) = synthetic_source();
    let dataset = source.open(location::BUCKET, location::PATH).unwrap();

    let result = dataset
        .query_point(&PointQuery::new(35.0, 135.0).with_variable_list("temperature"))
        .unwrap();

    assert_eq!(result.values.len(), 1);
    let VariableValue::Series(series) = &result.values["temperature"] else {
        panic!("expected a series");
    };
    assert_eq!(series.len(), 5);
    let keys: Vec<_> = series.keys().cloned().collect();
    assert_eq!(keys[0], "2023-01-01T00:00:00");
    assert_eq!(keys[4], "2023-01-05T00:00:00");
    assert_approx_eq!(
        series["2023-01-02T00:00:00"].unwrap(),
        value_at("temperature", 1, 35.0, 135.0).unwrap(),
        1e-9
    );
}

#[test]
fn test_time_selects_nearest_timestamp() {
    let (_data, source) = synthetic_source();
    let dataset = source.open(location::BUCKET, location::PATH).unwrap();

    let result = dataset
        .query_point(
            &PointQuery::new(35.0, 135.0)
                .with_variable_list("humidity")
                .with_time("2023-01-02T20:00:00"),
        )
        .unwrap();
    assert_eq!(
        result.values["humidity"],
        VariableValue::Scalar(value_at("humidity", 2, 35.0, 135.0).unwrap())
    );
}

#[test]
fn test_unknown_variable_fails_whole_query() {
    let (_data, source) = synthetic_source();
    let dataset = source.open(location::BUCKET, location::PATH).unwrap();

    let err = dataset
        .query_point(&PointQuery::new(35.0, 135.0).with_variable_list("temperature, wind"))
        .unwrap_err();

    match &err {
        DatasetError::UnknownVariables { invalid, available } => {
            assert_eq!(invalid, &vec!["wind".to_string()]);
            assert_eq!(available.len(), 3);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(err.is_client_error());
}

#[test]
fn test_empty_variable_entries_are_invalid() {
    let (_data, source) = synthetic_source();
    let dataset = source.open(location::BUCKET, location::PATH).unwrap();

    for list in ["", " ", "temperature,,humidity", "temperature,"] {
        let err = dataset
            .query_point(&PointQuery::new(35.0, 135.0).with_variable_list(list))
            .unwrap_err();
        match &err {
            DatasetError::UnknownVariables { invalid, .. } => {
                assert_eq!(invalid, &vec![String::new()], "list {:?}", list);
            }
            other => panic!("unexpected error {:?} for {:?}", other, list),
        }
        assert!(err.to_string().starts_with("Invalid variables: . Available"));
    }
}

#[test]
fn test_bad_time_is_reported_per_variable() {
    let (_data, source) = synthetic_source();
    let dataset = source.open(location::BUCKET, location::PATH).unwrap();

    let result = dataset
        .query_point(&PointQuery::new(35.0, 135.0).with_time("not-a-date"))
        .unwrap();

    for value in result.values.values() {
        let VariableValue::Error(message) = value else {
            panic!("expected an error slot, got {:?}", value);
        };
        assert!(message.starts_with("Failed to get data: Invalid time format"));
    }
}

#[test]
fn test_summary() {
    let (_data, source) = synthetic_source();
    let summary = source
        .open(location::BUCKET, location::PATH)
        .unwrap()
        .summary()
        .unwrap();

    assert_eq!(summary.variables, vec!["humidity", "pressure", "temperature"]);
    assert_eq!(summary.dimensions["time"], 5);
    assert_eq!(summary.coordinates.latitude.min, 30.0);
    assert_eq!(summary.coordinates.latitude.max, 40.0);
    assert_eq!(summary.coordinates.longitude.min, 130.0);
    assert_eq!(summary.coordinates.longitude.max, 140.0);

    let time = summary.coordinates.time.unwrap();
    assert_eq!(time.start, "2023-01-01T00:00:00");
    assert_eq!(time.end, "2023-01-05T00:00:00");

    assert_eq!(summary.attributes["description"], "Example Weather Dataset");
    assert_eq!(summary.attributes["created_at"], "2024-05-01T12:00:00.000000");
    assert_eq!(
        summary.attributes["variables"]["humidity"],
        "Relative Humidity (%)"
    );
}

/// Dataset exercising extra dimensions, missing values and a time-less variable.
fn cube_definition() -> DatasetDefinition {
    let times = vec![
        parse_time("2023-06-01").unwrap(),
        parse_time("2023-06-01T06:00:00").unwrap(),
    ];
    // NaN at flat indices 0, 5 and 10
    let surface = create_grid_with_missing(3, 4, 5);

    DatasetDefinition::default()
        .with_coordinate(Coordinate::time("time", times))
        .with_coordinate(Coordinate::numeric("latitude", vec![0.0, 1.0, 2.0]))
        .with_coordinate(Coordinate::numeric("longitude", vec![10.0, 11.0, 12.0, 13.0]))
        .with_coordinate(Coordinate::numeric("level", vec![850.0]))
        .with_coordinate(Coordinate::numeric("band", vec![1.0, 2.0]))
        .with_variable(VariableDefinition::new(
            "t",
            ["time", "latitude", "longitude"],
            create_test_cube(2, 3, 4),
        ))
        .with_variable(VariableDefinition::new(
            "surface",
            ["latitude", "longitude"],
            surface,
        ))
        .with_variable(VariableDefinition::new(
            "profile",
            ["level", "latitude", "longitude"],
            create_test_cube(1, 3, 4),
        ))
        .with_variable(VariableDefinition::new(
            "bands",
            ["band", "latitude", "longitude"],
            create_test_cube(2, 3, 4),
        ))
}

#[test]
fn test_extra_dimensions_and_missing_values() {
    let data = TempDataDir::new();
    write(&data, &cube_definition(), WriterConfig {
        compression: ZarrCompression::None,
        spatial_chunk_size: 2,
        ..Default::default()
    });
    let dataset = FilesystemSource::new(data.path())
        .open(location::BUCKET, location::PATH)
        .unwrap();

    let result = dataset
        .query_point(&PointQuery::new(1.2, 12.4).with_time("2023-06-01T05:00:00"))
        .unwrap();
    assert_eq!((result.latitude, result.longitude), (1.0, 12.0));

    assert_eq!(result.values["t"], VariableValue::Scalar(cube_value(1, 1, 2)));
    assert_eq!(result.values["surface"], VariableValue::Scalar(6.0));
    assert_eq!(result.values["profile"], VariableValue::Scalar(cube_value(0, 1, 2)));
    match &result.values["bands"] {
        VariableValue::Error(message) => {
            assert!(message.starts_with("Failed to get data:"));
            assert!(message.contains("band"));
        }
        other => panic!("expected error slot, got {:?}", other),
    }

    for (lat, lon) in [(0.0, 10.0), (1.0, 11.0), (2.0, 12.0)] {
        let result = dataset
            .query_point(&PointQuery::new(lat, lon).with_variable_list("surface"))
            .unwrap();
        match result.values["surface"] {
            VariableValue::Scalar(v) => assert!(v.is_nan(), "({}, {}) = {}", lat, lon, v),
            ref other => panic!("expected scalar, got {:?}", other),
        }
    }

    let result = dataset
        .query_point(&PointQuery::new(0.0, 10.0).with_variable_list("t"))
        .unwrap();
    let VariableValue::Series(series) = &result.values["t"] else {
        panic!("expected a series");
    };
    assert_eq!(series["2023-06-01T06:00:00"], Some(cube_value(1, 0, 0)));

    let summary = dataset.summary().unwrap();
    assert_eq!(summary.dimensions["band"], 2);
    assert_eq!(summary.coordinates.time.unwrap().end, "2023-06-01T06:00:00");
}

#[test]
fn test_dataset_without_time_has_null_time_range() {
    let data = TempDataDir::new();
    let definition = DatasetDefinition::default()
        .with_coordinate(Coordinate::numeric("latitude", vec![0.0, 1.0]))
        .with_coordinate(Coordinate::numeric("longitude", vec![0.0, 1.0]))
        .with_variable(VariableDefinition::new(
            "elevation",
            ["latitude", "longitude"],
            vec![1.0, 2.0, 3.0, 4.0],
        ));
    write(&data, &definition, WriterConfig::default());

    let dataset = FilesystemSource::new(data.path())
        .open(location::BUCKET, location::PATH)
        .unwrap();
    let summary = dataset.summary().unwrap();
    assert!(summary.coordinates.time.is_none());

    let json = serde_json::to_value(&summary).unwrap();
    assert!(json["coordinates"]["time"].is_null());

    let result = dataset
        .query_point(&PointQuery::new(1.0, 0.0).with_time("2023-01-01"))
        .unwrap();
    assert_eq!(result.values["elevation"], VariableValue::Scalar(3.0));
}

#[test]
fn test_missing_store_fails_to_open() {
    let data = TempDataDir::new();
    let err = FilesystemSource::new(data.path())
        .open("nonexistent", "weather.zarr")
        .unwrap_err();
    assert!(!err.is_client_error());
    assert!(!err.to_string().is_empty());
}
