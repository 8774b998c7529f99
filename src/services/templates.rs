//! Starter diagram catalog offered by the diagram-type picker.

pub const DEFAULT_TEMPLATE: &str = "flowchart";

const TEMPLATES: &[(&str, &str)] = &[
    (
        "flowchart",
        "flowchart TD
    A[Start] --> B{Is it working?}
    B -->|Yes| C[Great!]
    B -->|No| D[Debug]
    D --> B
    C --> E[End]",
    ),
    (
        "sequence",
        "sequenceDiagram
    participant Alice
    participant Bob
    Alice->>John: Hello John, how are you?
    loop Healthcheck
        John->>John: Fight against hypochondria
    end
    Note right of John: Rational thoughts!
    John-->>Alice: Great!
    John->>Bob: How about you?
    Bob-->>John: Jolly good!",
    ),
    (
        "class",
        "classDiagram
    Animal <|-- Duck
    Animal <|-- Fish
    Animal <|-- Zebra
    Animal : +int age
    Animal : +String gender
    Animal: +isMammal()
    Animal: +mate()
    class Duck{
        +String beakColor
        +swim()
        +quack()
    }
    class Fish{
        -int sizeInFeet
        -canEat()
    }
    class Zebra{
        +bool is_wild
        +run()
    }",
    ),
    (
        "state",
        "stateDiagram-v2
    [*] --> Still
    Still --> [*]
    Still --> Moving
    Moving --> Still
    Moving --> Crash
    Crash --> [*]",
    ),
    (
        "er",
        "erDiagram
    CUSTOMER ||--o{ ORDER : places
    ORDER ||--|{ LINE-ITEM : contains
    CUSTOMER }|..|{ DELIVERY-ADDRESS : uses
    CUSTOMER {
        string name
        string custNumber
        string sector
    }
    ORDER {
        int orderNumber
        string deliveryAddress
    }
    LINE-ITEM {
        string productCode
        int quantity
        float pricePerUnit
    }",
    ),
    (
        "gantt",
        "gantt
    title A Gantt Diagram
    dateFormat  YYYY-MM-DD
    section Section
    A task           :a1, 2024-01-01, 30d
    Another task     :after a1, 20d
    section Another
    Task in sec      :2024-01-12, 12d
    another task     :24d",
    ),
    (
        "pie",
        "pie showData
    title Key Elements in Product
    \"Calcium\" : 42.96
    \"Potassium\" : 50.05
    \"Magnesium\" : 10.01
    \"Iron\" :  5",
    ),
    (
        "mindmap",
        "mindmap
  root((mindmap))
    Origins
      Long history
      Popularisation
        British popular psychology author Tony Buzan
    Research
      On effectiveness<br/>and features
      On Automatic creation
        Uses
            Creative techniques
            Strategic planning
            Argument mapping
    Tools
      Pen and paper
      Mermaid",
    ),
    (
        "timeline",
        "timeline
    title History of Social Media Platform
    2002 : LinkedIn
    2004 : Facebook
         : Google
    2005 : Youtube
    2006 : Twitter",
    ),
    (
        "git",
        "gitGraph
    commit
    commit
    branch develop
    checkout develop
    commit
    commit
    checkout main
    merge develop
    commit
    commit",
    ),
];

/// Look up a template by diagram type.
#[must_use]
pub fn template(name: &str) -> Option<&'static str> {
    TEMPLATES
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, body)| *body)
}

/// Diagram types in picker order.
pub fn names() -> impl Iterator<Item = &'static str> {
    TEMPLATES.iter().map(|(key, _)| *key)
}

/// Text shown when nothing has been persisted yet.
#[must_use]
pub fn default_text() -> &'static str {
    template(DEFAULT_TEMPLATE).unwrap_or_default()
}
