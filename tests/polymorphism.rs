use oas_reflect::{
    CatalogContractResolver, Manifest, ResolverOptions, SchemaGenerator, SchemaGeneratorOptions,
    SchemaRepository, SchemaType, TypeCatalog,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

const VEHICLES: &str = r#"
types:
  - name: Vehicle
    namespace: Fleet
    discriminator: kind
    discriminator_value: vehicle
    members:
      - { name: Plate, type: string, required: true }
  - name: Car
    namespace: Fleet
    base: Vehicle
    discriminator_value: car
    members:
      - { name: Doors, type: int }
  - name: Truck
    namespace: Fleet
    base: Vehicle
    discriminator_value: truck
    members:
      - { name: Payload, type: double }
  - name: Garage
    namespace: Fleet
    members:
      - { name: Parked, type: "List<Vehicle>" }
"#;

fn vehicles(options: SchemaGeneratorOptions) -> (SchemaGenerator, TypeCatalog) {
    let (catalog, _) = Manifest::from_yaml(VEHICLES).unwrap().build().unwrap();
    let shared = Arc::new(catalog.clone());
    let resolver = Arc::new(CatalogContractResolver::new(
        shared.clone(),
        ResolverOptions::default(),
    ));
    (SchemaGenerator::new(shared, resolver, options), catalog)
}

#[test]
fn test_all_of_inheritance_with_one_of_union() {
    let (gen, catalog) = vehicles(
        SchemaGeneratorOptions::default()
            .with_all_of_for_inheritance()
            .with_one_of_for_polymorphism(),
    );
    let vehicle = catalog.find("Vehicle").unwrap();
    let mut repo = SchemaRepository::new();

    let union = gen.generate_schema(vehicle, &mut repo).unwrap();
    assert_eq!(
        serde_json::to_value(&union).unwrap(),
        json!({
            "oneOf": [
                {"$ref": "#/components/schemas/Vehicle"},
                {"$ref": "#/components/schemas/Car"},
                {"$ref": "#/components/schemas/Truck"}
            ],
            "discriminator": {
                "propertyName": "kind",
                "mapping": {
                    "vehicle": "#/components/schemas/Vehicle",
                    "car": "#/components/schemas/Car",
                    "truck": "#/components/schemas/Truck"
                }
            }
        })
    );

    let base = repo.definition("Vehicle").unwrap();
    assert!(base.required.contains("kind"));
    assert!(base.required.contains("plate"));
    assert_eq!(base.discriminator.as_ref().unwrap().property_name, "kind");

    let car = repo.definition("Car").unwrap();
    assert_eq!(car.all_of[0].reference_id(), Some("Vehicle"));
    let keys: Vec<&String> = car.properties.keys().collect();
    assert_eq!(keys, vec!["doors"]);
    assert!(!car.required.contains("kind"));
}

#[test]
fn test_one_of_without_all_of_inlines_inherited_members() {
    let (gen, catalog) = vehicles(SchemaGeneratorOptions::default().with_one_of_for_polymorphism());
    let vehicle = catalog.find("Vehicle").unwrap();
    let mut repo = SchemaRepository::new();
    gen.generate_schema(vehicle, &mut repo).unwrap();

    for id in ["Vehicle", "Car", "Truck"] {
        let body = repo.definition(id).unwrap();
        assert!(body.required.contains("kind"), "{id} must require kind");
        assert_eq!(body.properties["kind"].schema_type, Some(SchemaType::String));
        assert!(body.properties.contains_key("plate"), "{id} must carry plate");
        assert!(body.all_of.is_empty());
        assert!(body.discriminator.is_none());
    }
    let truck = repo.definition("Truck").unwrap();
    assert!(truck.properties.contains_key("payload"));
}

#[test]
fn test_union_is_used_wherever_the_base_appears() {
    let (gen, catalog) = vehicles(SchemaGeneratorOptions::default().with_one_of_for_polymorphism());
    let garage = catalog.find("Garage").unwrap();
    let mut repo = SchemaRepository::new();
    gen.generate_schema(garage, &mut repo).unwrap();

    let parked = &repo.definition("Garage").unwrap().properties["parked"];
    let items = parked.items.as_deref().unwrap();
    assert_eq!(items.one_of.len(), 3);
    assert_eq!(items.discriminator.as_ref().unwrap().mapping.len(), 3);

    let ids: Vec<String> = repo.schemas().into_keys().collect();
    assert_eq!(ids, vec!["Car", "Garage", "Truck", "Vehicle"]);
}

#[test]
fn test_inheritance_without_polymorphism_flattens() {
    let (gen, catalog) = vehicles(SchemaGeneratorOptions::default());
    let car = catalog.find("Car").unwrap();
    let mut repo = SchemaRepository::new();

    let schema = gen.generate_schema(car, &mut repo).unwrap();
    assert_eq!(schema.reference_id(), Some("Car"));
    let body = repo.definition("Car").unwrap();
    let keys: Vec<&String> = body.properties.keys().collect();
    assert_eq!(keys, vec!["plate", "doors"]);
    assert!(repo.definition("Vehicle").is_none());
}
